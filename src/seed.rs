//! Seed collections for first-run demo data.
//!
//! A collection is materialized from its seed the first time it is listed and
//! no persisted blob exists for it yet. Entities without a seed entry start
//! empty. The literal values here mirror the shipped demo content; prices are
//! in KES.

use chrono::Utc;
use serde_json::{json, Value as JsonValue};

use crate::auth::simple_hash;
use crate::model::{Role, User};

/// Returns the seed collection for `entity`, or `None` when the entity has no
/// seed and should start empty.
pub fn seed_for(entity: &str) -> Option<Vec<JsonValue>> {
    let current_month = Utc::now().format("%Y-%m").to_string();
    let today = Utc::now().format("%Y-%m-%d").to_string();

    let records = match entity {
        "UserSettings" => vec![json!({
            "id": "settings-1",
            "breakfast_time": "07:00",
            "lunch_time": "13:00",
            "dinner_time": "20:00",
            "monthly_budget": 6000,
            "food_preference": "kenyan",
            "household_size": 2
        })],
        // Seeded empty on purpose: first `list` persists the empty collection.
        "Meal" => vec![],
        "ShoppingItem" => vec![
            json!({ "id": "shop-1", "name": "Maize Meal (2kg)", "category": "staples", "quantity": "2 packets", "price": 230, "purchased": true, "month": current_month }),
            json!({ "id": "shop-2", "name": "Cooking Oil (1L)", "category": "staples", "quantity": "1 bottle", "price": 350, "purchased": true, "month": current_month }),
            json!({ "id": "shop-3", "name": "Sukuma Wiki", "category": "vegetables", "quantity": "3 bunches", "price": 60, "purchased": true, "month": current_month }),
            json!({ "id": "shop-4", "name": "Tomatoes", "category": "vegetables", "quantity": "1 kg", "price": 120, "purchased": false, "month": current_month }),
            json!({ "id": "shop-5", "name": "Beef (500g)", "category": "proteins", "quantity": "500g", "price": 350, "purchased": true, "month": current_month }),
            json!({ "id": "shop-6", "name": "Milk", "category": "dairy", "quantity": "2 liters", "price": 140, "purchased": false, "month": current_month }),
            json!({ "id": "shop-7", "name": "Eggs", "category": "proteins", "quantity": "6", "price": 120, "purchased": true, "month": current_month }),
        ],
        "PantryItem" => vec![
            json!({ "id": "pantry-1", "name": "Rice", "category": "staples", "quantity": "3", "unit": "kg", "last_updated": today, "low_stock_threshold": "1" }),
            json!({ "id": "pantry-2", "name": "Salt", "category": "spices", "quantity": "500", "unit": "g", "last_updated": today }),
            json!({ "id": "pantry-3", "name": "Onions", "category": "vegetables", "quantity": "5", "unit": "pcs", "last_updated": today, "low_stock_threshold": "2" }),
        ],
        _ => return None,
    };

    Some(records)
}

/// The two accounts present in a fresh `Users` directory.
pub fn seeded_users() -> Vec<User> {
    vec![
        User {
            id: "admin-1".to_string(),
            email: "gee.mwerevu@gmail.com".to_string(),
            username: Some("superadmin".to_string()),
            name: None,
            password_hash: Some(simple_hash("passcode123!")),
            role: Role::Admin,
            is_active: true,
            email_verified: true,
            created_at: "2024-01-01T00:00:00Z".to_string(),
            last_login_at: None,
        },
        User {
            id: "user-demo".to_string(),
            email: "demo@mealtrack.pro".to_string(),
            username: None,
            name: None,
            password_hash: Some(simple_hash("demo123!")),
            role: Role::User,
            is_active: true,
            email_verified: true,
            created_at: "2024-06-01T00:00:00Z".to_string(),
            last_login_at: None,
        },
    ]
}
