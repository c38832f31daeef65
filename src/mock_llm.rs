//! Mock stand-in for the external content-generation service.
//!
//! Prompts are classified by substring against an ordered dispatch table;
//! the first match decides the response shape and unmatched prompts fall
//! through to the multi-day meal-plan generator. All payload content is
//! fixed demo data; only the meal plan varies between calls.

use std::thread;
use std::time::Duration;

use log::info;
use rand::Rng;
use serde_json::{json, Value as JsonValue};

/// Artificial latency applied to every call, emulating a network round-trip.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1500);

type Handler = fn() -> JsonValue;

/// Dispatch table, evaluated in order. Patterns earlier in the table win.
const ROUTES: &[(&str, Handler)] = &[
    ("Analyze this meal planning data", analytics_insights),
    ("Generate a shopping list", shopping_list),
    ("detailed recipe", recipe),
    ("Suggest 2-3 alternative meals", meal_swaps),
];

pub struct MockLlm {
    delay: Duration,
}

impl Default for MockLlm {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
        }
    }
}

impl MockLlm {
    /// Responder with a custom latency. Tests use `Duration::ZERO`.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    /// Classifies `prompt` and returns exactly one structured payload.
    ///
    /// Blocks for the configured delay first; a caller that loses interest
    /// can simply discard the result, no background work continues.
    pub fn invoke(&self, prompt: &str) -> JsonValue {
        info!("Mock LLM invoked, prompt length {}", prompt.len());
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        for (pattern, handler) in ROUTES {
            if prompt.contains(pattern) {
                return handler();
            }
        }
        meal_plan(prompt)
    }
}

fn analytics_insights() -> JsonValue {
    json!({
        "insights": [
            { "type": "success", "message": "Great job staying within budget so far!" },
            { "type": "tip", "message": "Try buying beans in bulk to save ~200 KES." },
            { "type": "warning", "message": " Dinner costs are 15% higher than average." },
            { "type": "saving", "message": "You saved 500 KES by cooking 5 days straight." }
        ]
    })
}

fn shopping_list() -> JsonValue {
    json!({
        "items": [
            { "name": "Maize Meal (2kg)", "category": "staples", "quantity": "1 packet", "price": 230 },
            { "name": "Cooking Oil (1L)", "category": "staples", "quantity": "1 bottle", "price": 350 },
            { "name": "Sukuma Wiki", "category": "vegetables", "quantity": "3 bunches", "price": 60 },
            { "name": "Tomatoes", "category": "vegetables", "quantity": "1 kg", "price": 120 },
            { "name": "Beef (500g)", "category": "proteins", "quantity": "500g", "price": 350 },
            { "name": "Milk", "category": "dairy", "quantity": "2 liters", "price": 140 },
            { "name": "Eggs", "category": "proteins", "quantity": "6", "price": 120 }
        ]
    })
}

fn recipe() -> JsonValue {
    json!({
        "ingredients": [
            { "name": "Maize Flour", "quantity": "2 cups", "in_pantry": true },
            { "name": "Water", "quantity": "3 cups", "in_pantry": true },
            { "name": "Sukuma Wiki", "quantity": "1 bunch", "in_pantry": false },
            { "name": "Onion", "quantity": "1 medium", "in_pantry": true },
            { "name": "Tomato", "quantity": "1 large", "in_pantry": true },
            { "name": "Oil", "quantity": "1 tbsp", "in_pantry": true }
        ],
        "instructions": [
            "Boil water in a sufuria.",
            "Stir in maize flour gradually until firm.",
            "Cover and cook for 5 minutes.",
            "In another pan, fry onions and tomatoes.",
            "Add chopped sukuma wiki and simmer for 5 minutes.",
            "Serve hot."
        ],
        "prep_time": "10 mins",
        "cook_time": "20 mins",
        "servings": 2,
        "nutrition": {
            "calories": 450,
            "protein": 12,
            "carbs": 80,
            "fats": 8,
            "fiber": 15
        },
        "tips": [
            "Use leftover ugali for breakfast with tea.",
            "Add spinach for more vitamins."
        ]
    })
}

fn meal_swaps() -> JsonValue {
    json!({
        "suggestions": [
            { "name": "Githeri (Bean Stew)", "estimated_cost": 90, "pantry_usage_score": 80, "reason": "Uses beans from pantry and is cheaper." },
            { "name": "Chapati & Ndengu", "estimated_cost": 110, "pantry_usage_score": 60, "reason": "High protein and very filling." },
            { "name": "Rice & Cabbage", "estimated_cost": 70, "pantry_usage_score": 90, "reason": "Super budget friendly and quick." }
        ]
    })
}

// (name, cost in KES, prep notes)
type MealOption = (&'static str, u32, &'static str);

pub(crate) const BREAKFAST_OPTIONS: &[MealOption] = &[
    ("Mandazi and Tea", 50, "Fry mandazi or buy fresh"),
    ("Oatmeal with Milk", 60, "Cook with honey"),
    ("Chapati and Eggs", 80, "Scrambled or fried"),
    ("Uji (Porridge)", 30, "Add sugar and lemon"),
    ("Toast and Avocado", 70, "Fresh morning meal"),
    ("Samosa and Tea", 55, "Buy or make ahead"),
    ("Mahamri and Chai", 45, "Sweet coconut bread"),
    ("Pancakes", 65, "With honey or jam"),
    ("Boiled Eggs and Bread", 50, "Quick protein breakfast"),
    ("Fruit Salad", 60, "Seasonal fruits"),
];

pub(crate) const LUNCH_OPTIONS: &[MealOption] = &[
    ("Rice and Beans", 120, "Cook with onions and tomatoes"),
    ("Pilau with Kachumbari", 150, "Use pilau masala"),
    ("Chapati and Ndengu", 100, "Green grams stew"),
    ("Githeri", 90, "Maize and beans mix"),
    ("Matoke and Beef", 180, "Slow cook the matoke"),
    ("Mukimo and Stew", 130, "Mashed with greens"),
    ("Biriani", 200, "Special occasion meal"),
    ("Fish and Ugali", 170, "Fried tilapia"),
    ("Spaghetti Bolognese", 140, "With minced meat"),
    ("Chicken Stew and Rice", 190, "Sunday lunch style"),
];

pub(crate) const DINNER_OPTIONS: &[MealOption] = &[
    ("Ugali and Sukuma Wiki", 80, "Classic Kenyan dinner"),
    ("Chapati and Beans", 110, "Filling dinner"),
    ("Rice and Cabbage", 70, "Budget friendly"),
    ("Ugali and Omena", 100, "With silver fish"),
    ("Mashed Potatoes and Greens", 90, "Comfort food"),
    ("Wali wa Nazi", 130, "Coconut rice with fish"),
    ("Ugali and Beef Stew", 150, "Hearty dinner"),
    ("Vegetable Curry and Rice", 100, "Spiced vegetables"),
    ("Mokimo", 85, "With avocado"),
    ("Sima and Kunde", 75, "Cowpeas and ugali"),
];

/// Per-slot sampler: draws without replacement until the pool is exhausted,
/// then resets. The draw right after a reset may repeat any option,
/// including the one just used.
pub(crate) struct PoolSampler {
    available: Vec<usize>,
    len: usize,
}

impl PoolSampler {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            available: (0..len).collect(),
            len,
        }
    }

    pub(crate) fn draw(&mut self, rng: &mut impl Rng) -> usize {
        if self.available.is_empty() {
            self.available = (0..self.len).collect();
        }
        let pick = rng.gen_range(0..self.available.len());
        self.available.swap_remove(pick)
    }
}

/// Day count for the meal-plan shape. Checks are ordered so the most
/// specific phrase wins; anything unrecognized plans a week.
pub(crate) fn parse_day_count(prompt: &str) -> usize {
    if prompt.contains("14 days") {
        14
    } else if prompt.contains("30 days")
        || prompt.contains("entire month")
        || prompt.contains("full month")
    {
        30
    } else if prompt.contains("week") {
        7
    } else {
        7
    }
}

fn meal_json(option: &MealOption) -> JsonValue {
    let (name, cost, prep_notes) = option;
    json!({ "name": name, "cost": cost, "prep_notes": prep_notes })
}

fn meal_plan(prompt: &str) -> JsonValue {
    let num_days = parse_day_count(prompt);
    let mut rng = rand::thread_rng();

    let mut breakfast = PoolSampler::new(BREAKFAST_OPTIONS.len());
    let mut lunch = PoolSampler::new(LUNCH_OPTIONS.len());
    let mut dinner = PoolSampler::new(DINNER_OPTIONS.len());

    let days: Vec<JsonValue> = (0..num_days)
        .map(|_| {
            json!({
                "breakfast": meal_json(&BREAKFAST_OPTIONS[breakfast.draw(&mut rng)]),
                "lunch": meal_json(&LUNCH_OPTIONS[lunch.draw(&mut rng)]),
                "dinner": meal_json(&DINNER_OPTIONS[dinner.draw(&mut rng)]),
            })
        })
        .collect();

    json!({ "days": days })
}
