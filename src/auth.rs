//! User directory, session and audit trail.
//!
//! State machine for the session: no session -> login success ->
//! active(user, expiry) -> logout or expiry -> no session. At most one
//! session exists per store; it is persisted under the `auth_session` key in
//! the same flat namespace as the entity collections, so the `Users` and
//! `AuditLog` directories stay readable through the entity store as plain
//! collections.
//!
//! Auth operations take `&mut self`, so a host that shares one `AuthStore`
//! across threads already serializes them through Rust's aliasing rules; the
//! entity store's internal write lock covers the audit append separately.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use log::{error, warn};
use thiserror::Error;

use crate::app_response::AppResponse;
use crate::entity_store::EntityStore;
use crate::model::{AuditEntry, Role, Session, User};
use crate::seed;

pub const USERS_KEY: &str = "Users";
pub const AUDIT_LOG_KEY: &str = "AuditLog";
pub const SESSION_KEY: &str = "auth_session";

const SESSION_TTL_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Auth failures surfaced to the caller. The messages are the user-visible
/// strings the UI shows verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Account is deactivated. Please contact support.")]
    AccountDeactivated,
    #[error("Please verify your email before logging in.")]
    EmailNotVerified,
    #[error("An account with this email already exists.")]
    EmailAlreadyExists,
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl From<AppResponse> for AuthError {
    fn from(resp: AppResponse) -> Self {
        AuthError::Storage(resp.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Storage(format!("JSON serialization error: {err}"))
    }
}

impl From<AuthError> for AppResponse {
    fn from(err: AuthError) -> Self {
        let msg = err.to_string();
        match err {
            AuthError::EmailAlreadyExists => AppResponse::ValidationError(msg),
            AuthError::Storage(_) => AppResponse::DatabaseError(msg),
            _ => AppResponse::Unauthorized(msg),
        }
    }
}

/// Demo-grade string digest (the classic shift-and-subtract 32-bit hash over
/// UTF-16 code units). NOT a cryptographic hash: it exists only to keep
/// parity with the persisted demo user directory and must never guard real
/// accounts.
pub(crate) fn simple_hash(input: &str) -> String {
    let mut hash: i32 = 0;
    for unit in input.encode_utf16() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit));
    }
    hash.to_string()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct AuthStore {
    store: Arc<EntityStore>,
    session: Option<Session>,
    user_agent: String,
}

impl AuthStore {
    /// Seeds the user directory on first run and restores a persisted
    /// session when its expiry is still in the future. An expired or
    /// unreadable session is discarded.
    pub fn init(store: Arc<EntityStore>, user_agent: impl Into<String>) -> Result<Self, AuthError> {
        if store.get_raw(USERS_KEY)?.is_none() {
            let blob = serde_json::to_string(&seed::seeded_users())?;
            store.put_raw(USERS_KEY, &blob)?;
        }

        let session = match store.get_raw(SESSION_KEY)? {
            None => None,
            Some(blob) => match serde_json::from_str::<Session>(&blob) {
                Ok(session) if session.expires > Utc::now().timestamp_millis() => Some(session),
                _ => {
                    store.remove_raw(SESSION_KEY)?;
                    None
                }
            },
        };

        Ok(Self {
            store,
            session,
            user_agent: user_agent.into(),
        })
    }

    /// Authenticates by case-insensitive email or exact username.
    ///
    /// On success the user directory gets a fresh `last_login_at`, a 24-hour
    /// session is persisted and the user is returned with the password
    /// digest stripped.
    pub fn login(&mut self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let digest = simple_hash(password);
        let mut users = self.users();

        let position = users.iter().position(|u| {
            u.email.eq_ignore_ascii_case(identifier) || u.username.as_deref() == Some(identifier)
        });
        let position = match position {
            Some(p) if users[p].password_hash.as_deref() == Some(digest.as_str()) => p,
            _ => {
                self.add_audit_log("LOGIN_FAILED", Some("User"), Some(identifier));
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !users[position].is_active {
            let id = users[position].id.clone();
            self.add_audit_log("LOGIN_BLOCKED", Some("User"), Some(&id));
            return Err(AuthError::AccountDeactivated);
        }
        if !users[position].email_verified {
            return Err(AuthError::EmailNotVerified);
        }

        users[position].last_login_at = Some(now_iso());
        let user = users[position].stripped();
        self.save_users(&users)?;

        let session = Session {
            user: user.clone(),
            expires: Utc::now().timestamp_millis() + SESSION_TTL_MILLIS,
        };
        self.store
            .put_raw(SESSION_KEY, &serde_json::to_string(&session)?)?;
        self.session = Some(session);

        self.add_audit_log("LOGIN_SUCCESS", Some("User"), Some(&user.id));
        Ok(user)
    }

    /// Creates a `USER`-role account, auto-verified and active (there is no
    /// mail delivery to verify against). `name` falls back to the email
    /// local part.
    pub fn signup(
        &mut self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User, AuthError> {
        let mut users = self.users();
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(AuthError::EmailAlreadyExists);
        }

        let name = name
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string());

        let user = User {
            id: format!("user-{}", Utc::now().timestamp_millis()),
            email: email.to_string(),
            username: None,
            name: Some(name),
            password_hash: Some(simple_hash(password)),
            role: Role::User,
            is_active: true,
            email_verified: true,
            created_at: now_iso(),
            last_login_at: None,
        };

        users.push(user.clone());
        self.save_users(&users)?;
        self.add_audit_log("USER_CREATED", Some("User"), Some(&user.id));
        Ok(user.stripped())
    }

    /// Clears the persisted and in-memory session.
    pub fn logout(&mut self) -> Result<(), AuthError> {
        let user_id = self.session.as_ref().map(|s| s.user.id.clone());
        self.add_audit_log("LOGOUT", Some("User"), user_id.as_deref());
        self.store.remove_raw(SESSION_KEY)?;
        self.session = None;
        Ok(())
    }

    /// Records the reset request. No email is sent; the caller succeeds
    /// whether or not the address exists so the directory is not probeable.
    pub fn forgot_password(&mut self, email: &str) -> Result<(), AuthError> {
        let users = self.users();
        if let Some(user) = users.iter().find(|u| u.email.eq_ignore_ascii_case(email)) {
            let id = user.id.clone();
            self.add_audit_log("PASSWORD_RESET_REQUESTED", Some("User"), Some(&id));
        }
        Ok(())
    }

    /// Re-digests the password for every account matching `email`.
    pub fn reset_password(&mut self, email: &str, new_password: &str) -> Result<(), AuthError> {
        let digest = simple_hash(new_password);
        let mut users = self.users();
        for user in users
            .iter_mut()
            .filter(|u| u.email.eq_ignore_ascii_case(email))
        {
            user.password_hash = Some(digest.clone());
        }
        self.save_users(&users)?;
        self.add_audit_log("PASSWORD_RESET_COMPLETED", Some("User"), Some(email));
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.session
            .as_ref()
            .map_or(false, |s| s.user.role == Role::Admin)
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    /// Appends an audit entry. Audit failures are logged and swallowed; the
    /// trail is best-effort and must never fail the triggering operation.
    pub fn add_audit_log(
        &self,
        action: &str,
        entity_type: Option<&str>,
        entity_id: Option<&str>,
    ) {
        if let Err(e) = self.append_audit(action, entity_type, entity_id) {
            error!("Failed to add audit log: {e}");
        }
    }

    fn append_audit(
        &self,
        action: &str,
        entity_type: Option<&str>,
        entity_id: Option<&str>,
    ) -> Result<(), AuthError> {
        let _guard = self.store.write_guard();

        let mut entries: Vec<AuditEntry> = match self.store.get_raw(AUDIT_LOG_KEY)? {
            Some(blob) => serde_json::from_str(&blob).unwrap_or_else(|e| {
                warn!("Corrupt audit log, starting fresh: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };

        entries.push(AuditEntry {
            id: format!("log-{}", Utc::now().timestamp_millis()),
            user_id: self.session.as_ref().map(|s| s.user.id.clone()),
            action: action.to_string(),
            entity_type: entity_type.map(str::to_string),
            entity_id: entity_id.map(str::to_string),
            ip_address: "127.0.0.1".to_string(),
            user_agent: self.user_agent.clone(),
            timestamp: now_iso(),
        });

        self.store
            .put_raw(AUDIT_LOG_KEY, &serde_json::to_string(&entries)?)?;
        Ok(())
    }

    /// The user directory, falling back to the seeded accounts when the
    /// persisted blob is absent or unreadable.
    fn users(&self) -> Vec<User> {
        match self.store.get_raw(USERS_KEY) {
            Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_else(|e| {
                warn!("Corrupt user directory, falling back to seeds: {e}");
                seed::seeded_users()
            }),
            Ok(None) => seed::seeded_users(),
            Err(e) => {
                warn!("Failed to read user directory, falling back to seeds: {e}");
                seed::seeded_users()
            }
        }
    }

    fn save_users(&self, users: &[User]) -> Result<(), AuthError> {
        self.store
            .put_raw(USERS_KEY, &serde_json::to_string(users)?)?;
        Ok(())
    }
}
