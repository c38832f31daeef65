//! Data model definitions for the MealTrack core.
//!
//! Entity records are deliberately schema-less: the UI writes whatever fields
//! a page needs and the store never validates them. Only the auth subsystem
//! works with typed models, because it has to inspect and rewrite specific
//! fields (`password_hash`, `is_active`, `last_login_at`, ...).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A single persisted entity record: named JSON fields plus a unique `id`
/// minted at creation time. Order of fields is preserved as received.
pub type Record = Map<String, JsonValue>;

/// Account role. Stored in JSON as `"ADMIN"` / `"USER"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

/// A user account in the `Users` directory.
///
/// `password_hash` is skipped during serialization when `None`, which is how
/// session users and login results are returned with the digest stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: String,
    #[serde(default)]
    pub last_login_at: Option<String>,
}

impl User {
    /// Copy of this user with the password digest removed. This is the only
    /// shape that ever leaves the auth store.
    pub fn stripped(&self) -> User {
        User {
            password_hash: None,
            ..self.clone()
        }
    }
}

/// The single active session, persisted under the `auth_session` key.
///
/// `expires` is an epoch-millis deadline; a restored session whose deadline
/// has passed is discarded rather than resumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub expires: i64,
}

/// Append-only audit trail entry. Entries are never updated or deleted by
/// the application once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub user_id: Option<String>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub ip_address: String,
    pub user_agent: String,
    pub timestamp: String,
}

/// Request payload accepted by [`invoke_llm`](crate::invoke_llm).
///
/// The `response_json_schema` hint is accepted for caller compatibility but
/// ignored: the mock picks the response shape from the prompt alone.
#[derive(Debug, Deserialize)]
pub struct LlmRequest {
    pub prompt: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub response_json_schema: Option<JsonValue>,
}
