//! # MealTrack Core
//!
//! Local-first storage, auth and mock AI core for the MealTrack
//! meal-planning app, designed for FFI integration with host UIs. Built on
//! redb (a pure-Rust embedded key-value store) so the whole application
//! state lives in a single local file with ACID guarantees.
//!
//! ## Features
//!
//! - **Generic entity store**: schema-less JSON collections with
//!   list/filter/create/bulkCreate/update/delete and lazy seed data
//! - **Mock AI responder**: prompt-pattern dispatch returning canned
//!   insights, shopping lists, recipes, meal swaps and multi-day meal plans
//! - **Auth and sessions**: demo-grade user directory, 24-hour sessions and
//!   an append-only audit trail
//! - **Safe error handling**: no `unwrap()` calls in production code; every
//!   FFI call returns a JSON [`AppResponse`] envelope
//!
//! ## Quick Start
//!
//! ```no_run
//! use mealtrack_core::AppState;
//! use serde_json::json;
//!
//! let mut state = AppState::init("mealtrack", "host-ui/1.0").unwrap();
//!
//! // Entity CRUD
//! let fields = json!({"name": "Ugali and Sukuma Wiki", "cost": 80});
//! let meal = state.store.create("Meal", fields.as_object().unwrap().clone()).unwrap();
//! assert!(meal.get("id").is_some());
//!
//! // Auth
//! let user = state.auth.login("demo@mealtrack.pro", "demo123!").unwrap();
//! assert!(user.password_hash.is_none());
//! ```
//!
//! ## FFI Functions
//!
//! C-compatible entry points for cross-language integration:
//!
//! - [`create_store`] / [`close_store`] - store lifecycle
//! - [`list_records`], [`filter_records`], [`create_record`],
//!   [`bulk_create_records`], [`update_record`], [`delete_record`] - entity CRUD
//! - [`invoke_llm`] - mock content-generation calls
//! - [`auth_login`], [`auth_signup`], [`auth_logout`],
//!   [`auth_forgot_password`], [`auth_reset_password`], [`auth_is_admin`],
//!   [`auth_is_authenticated`], [`auth_current_user`], [`add_audit_log`] - auth
//! - [`free_string`] - releases strings returned by the functions above

pub mod app_response;
pub mod auth;
pub mod entity_store;
pub mod mock_llm;
pub mod model;
mod seed;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use crate::app_response::AppResponse;
use crate::auth::AuthStore;
use crate::entity_store::EntityStore;
use crate::mock_llm::MockLlm;
use crate::model::LlmRequest;

/// Everything a host needs, bundled behind one pointer: the entity store,
/// the auth/session store sharing its namespace, and the mock responder.
///
/// Constructed once at process start and torn down with [`close_store`];
/// there is no implicit global state.
pub struct AppState {
    pub store: Arc<EntityStore>,
    pub auth: AuthStore,
    pub llm: MockLlm,
}

impl AppState {
    pub fn init(name: impl AsRef<Path>, user_agent: &str) -> Result<Self, AppResponse> {
        let path = name.as_ref().with_extension("redb");
        let store = Arc::new(EntityStore::init(path)?);
        let auth = AuthStore::init(Arc::clone(&store), user_agent)?;
        Ok(Self {
            store,
            auth,
            llm: MockLlm::default(),
        })
    }
}

/// Creates a new application store with the specified name.
///
/// Opens (or creates) the backing database file `<name>.redb`, seeds the
/// demo user directory on first run and restores any unexpired session.
///
/// # Parameters
///
/// * `name` - Null-terminated C string, the database name/path without extension
/// * `user_agent` - Null-terminated C string recorded in audit entries
///
/// # Returns
///
/// A pointer to the [`AppState`] instance on success, or a null pointer on
/// failure. The caller owns the pointer and must release it with
/// [`close_store`].
///
/// # Safety
///
/// Both arguments must be valid, null-terminated UTF-8 C strings.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store(name: *const c_char, user_agent: *const c_char) -> *mut AppState {
    if name.is_null() || user_agent.is_null() {
        warn!("Null pointer passed to create_store");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };
    let user_agent_str = match unsafe { CStr::from_ptr(user_agent).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in user_agent parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    match AppState::init(name_str, user_agent_str) {
        Ok(state) => {
            info!("Store '{name_str}' initialized successfully");
            Box::into_raw(Box::new(state))
        }
        Err(e) => {
            warn!("Failed to initialize store '{name_str}': {e}");
            std::ptr::null_mut()
        }
    }
}

/// Returns the full collection for an entity name as a JSON array.
///
/// First access of a never-initialized entity materializes its seed data.
/// Entities without seeds return an empty array; this call never fails for
/// an unknown entity name.
///
/// # Safety
///
/// `state` must be a pointer returned by [`create_store`]; `entity` must be
/// a valid C string.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn list_records(state: *mut AppState, entity: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to list_records"),
    };
    let entity = match c_ptr_to_string(entity, "entity") {
        Ok(s) => s,
        Err(err) => return err,
    };

    match state.store.list(&entity) {
        Ok(records) => serialize_ok(&records),
        Err(e) => response_to_c_string(&e),
    }
}

/// Returns the records whose fields loosely match every criterion in the
/// given JSON object. An empty criteria object returns the full collection.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn filter_records(
    state: *mut AppState,
    entity: *const c_char,
    criteria_json: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to filter_records"),
    };
    let entity = match c_ptr_to_string(entity, "entity") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let criteria_str = match c_ptr_to_string(criteria_json, "criteria") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let criteria = match serde_json::from_str(&criteria_str) {
        Ok(c) => c,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid criteria JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match state.store.filter(&entity, &criteria) {
        Ok(records) => serialize_ok(&records),
        Err(e) => response_to_c_string(&e),
    }
}

/// Appends a new record built from the given JSON fields, minting its `id`,
/// and returns the stored record.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_record(
    state: *mut AppState,
    entity: *const c_char,
    fields_json: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to create_record"),
    };
    let entity = match c_ptr_to_string(entity, "entity") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let fields_str = match c_ptr_to_string(fields_json, "fields") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let fields = match serde_json::from_str(&fields_str) {
        Ok(f) => f,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match state.store.create(&entity, fields) {
        Ok(record) => serialize_ok(&record),
        Err(e) => response_to_c_string(&e),
    }
}

/// Same as repeated [`create_record`] but in one persisted write. Takes a
/// JSON array of field objects; returns the created records in input order.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn bulk_create_records(
    state: *mut AppState,
    entity: *const c_char,
    items_json: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to bulk_create_records"),
    };
    let entity = match c_ptr_to_string(entity, "entity") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let items_str = match c_ptr_to_string(items_json, "items") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let items = match serde_json::from_str(&items_str) {
        Ok(i) => i,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match state.store.bulk_create(&entity, items) {
        Ok(records) => serialize_ok(&records),
        Err(e) => response_to_c_string(&e),
    }
}

/// Shallow-merges a JSON patch over the record with the given id. Returns
/// the updated record, or `NotFound` (with no write) when the id is absent.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_record(
    state: *mut AppState,
    entity: *const c_char,
    id: *const c_char,
    patch_json: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to update_record"),
    };
    let entity = match c_ptr_to_string(entity, "entity") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let id = match c_ptr_to_string(id, "id") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let patch_str = match c_ptr_to_string(patch_json, "patch") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let patch = match serde_json::from_str(&patch_str) {
        Ok(p) => p,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    match state.store.update(&entity, &id, patch) {
        Ok(Some(record)) => serialize_ok(&record),
        Ok(None) => {
            let error = AppResponse::NotFound(format!("No record found with id: {id}"));
            response_to_c_string(&error)
        }
        Err(e) => response_to_c_string(&e),
    }
}

/// Removes the record with the given id if present. Idempotent: the result
/// is `Ok("true")` whether or not a record was actually removed.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_record(
    state: *mut AppState,
    entity: *const c_char,
    id: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to delete_record"),
    };
    let entity = match c_ptr_to_string(entity, "entity") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let id = match c_ptr_to_string(id, "id") {
        Ok(s) => s,
        Err(err) => return err,
    };

    match state.store.delete(&entity, &id) {
        Ok(removed) => response_to_c_string(&AppResponse::Ok(removed.to_string())),
        Err(e) => response_to_c_string(&e),
    }
}

/// Invokes the mock content-generation responder.
///
/// Takes a JSON request `{"prompt": "...", "response_json_schema": ...}`
/// (the schema hint is ignored) and returns the structured payload selected
/// by the prompt's pattern. Blocks for the configured artificial latency.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn invoke_llm(state: *mut AppState, request_json: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to invoke_llm"),
    };
    let request_str = match c_ptr_to_string(request_json, "request") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let request: LlmRequest = match serde_json::from_str(&request_str) {
        Ok(r) => r,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid request JSON: {e}"));
            return response_to_c_string(&error);
        }
    };

    let payload = state.llm.invoke(&request.prompt);
    serialize_ok(&payload)
}

/// Authenticates with a case-insensitive email or exact username plus
/// password. On success returns the user JSON with the password digest
/// stripped; failures come back as `Unauthorized` with the user-visible
/// message.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_login(
    state: *mut AppState,
    identifier: *const c_char,
    password: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to auth_login"),
    };
    let identifier = match c_ptr_to_string(identifier, "identifier") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let password = match c_ptr_to_string(password, "password") {
        Ok(s) => s,
        Err(err) => return err,
    };

    match state.auth.login(&identifier, &password) {
        Ok(user) => serialize_ok(&user),
        Err(e) => response_to_c_string(&e.into()),
    }
}

/// Creates a new account. `name` may be null, in which case the email local
/// part is used. Returns the created user with the digest stripped.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_signup(
    state: *mut AppState,
    email: *const c_char,
    password: *const c_char,
    name: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to auth_signup"),
    };
    let email = match c_ptr_to_string(email, "email") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let password = match c_ptr_to_string(password, "password") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let name = if name.is_null() {
        None
    } else {
        match c_ptr_to_string(name, "name") {
            Ok(s) => Some(s),
            Err(err) => return err,
        }
    };

    match state.auth.signup(&email, &password, name.as_deref()) {
        Ok(user) => serialize_ok(&user),
        Err(e) => response_to_c_string(&e.into()),
    }
}

/// Ends the active session and records a `LOGOUT` audit entry.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_logout(state: *mut AppState) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to auth_logout"),
    };

    match state.auth.logout() {
        Ok(()) => response_to_c_string(&AppResponse::success("Logged out")),
        Err(e) => response_to_c_string(&e.into()),
    }
}

/// Records a password-reset request. Succeeds whether or not the email
/// exists; no email is actually sent.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_forgot_password(
    state: *mut AppState,
    email: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to auth_forgot_password"),
    };
    let email = match c_ptr_to_string(email, "email") {
        Ok(s) => s,
        Err(err) => return err,
    };

    match state.auth.forgot_password(&email) {
        Ok(()) => response_to_c_string(&AppResponse::Ok("true".to_string())),
        Err(e) => response_to_c_string(&e.into()),
    }
}

/// Replaces the password digest for accounts matching the email.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_reset_password(
    state: *mut AppState,
    email: *const c_char,
    new_password: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to auth_reset_password"),
    };
    let email = match c_ptr_to_string(email, "email") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let new_password = match c_ptr_to_string(new_password, "new_password") {
        Ok(s) => s,
        Err(err) => return err,
    };

    match state.auth.reset_password(&email, &new_password) {
        Ok(()) => response_to_c_string(&AppResponse::Ok("true".to_string())),
        Err(e) => response_to_c_string(&e.into()),
    }
}

/// `Ok("true")` when the active session belongs to an `ADMIN` user.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_is_admin(state: *mut AppState) -> *const c_char {
    match unsafe { state.as_ref() } {
        Some(s) => response_to_c_string(&AppResponse::Ok(s.auth.is_admin().to_string())),
        None => bad_request("Null state pointer passed to auth_is_admin"),
    }
}

/// `Ok("true")` when a session is active.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_is_authenticated(state: *mut AppState) -> *const c_char {
    match unsafe { state.as_ref() } {
        Some(s) => response_to_c_string(&AppResponse::Ok(s.auth.is_authenticated().to_string())),
        None => bad_request("Null state pointer passed to auth_is_authenticated"),
    }
}

/// The session user as JSON, or `NotFound` when no session is active.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_current_user(state: *mut AppState) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to auth_current_user"),
    };

    match state.auth.current_user() {
        Some(user) => serialize_ok(user),
        None => response_to_c_string(&AppResponse::NotFound("No active session".to_string())),
    }
}

/// Appends an application-level audit entry attributed to the session user.
/// `entity_type` and `entity_id` may be null.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_audit_log(
    state: *mut AppState,
    action: *const c_char,
    entity_type: *const c_char,
    entity_id: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return bad_request("Null state pointer passed to add_audit_log"),
    };
    let action = match c_ptr_to_string(action, "action") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let entity_type = if entity_type.is_null() {
        None
    } else {
        match c_ptr_to_string(entity_type, "entity_type") {
            Ok(s) => Some(s),
            Err(err) => return err,
        }
    };
    let entity_id = if entity_id.is_null() {
        None
    } else {
        match c_ptr_to_string(entity_id, "entity_id") {
            Ok(s) => Some(s),
            Err(err) => return err,
        }
    };

    state
        .auth
        .add_audit_log(&action, entity_type.as_deref(), entity_id.as_deref());
    response_to_c_string(&AppResponse::success("Audit entry recorded"))
}

/// Closes the store and releases all resources.
///
/// Consumes the pointer: the state must not be used again after this call.
///
/// # Safety
///
/// `state` must be a pointer previously returned by [`create_store`] that
/// has not already been closed.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_store(state: *mut AppState) -> *const c_char {
    if state.is_null() {
        return bad_request("Null state pointer passed to close_store");
    }

    drop(unsafe { Box::from_raw(state) });
    info!("Store closed");
    response_to_c_string(&AppResponse::success("Store closed successfully"))
}

/// Releases a string previously returned by any function in this library.
///
/// # Safety
///
/// `ptr` must be a pointer returned by this library that has not already
/// been freed. Null is ignored.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

fn serialize_ok<T: serde::Serialize>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Failed to serialize result: {e}"));
            response_to_c_string(&error)
        }
    }
}

fn bad_request(msg: &str) -> *const c_char {
    response_to_c_string(&AppResponse::BadRequest(msg.to_string()))
}

/// Serializes a response to JSON and hands it across the FFI boundary as a
/// C string. The caller releases it with [`free_string`].
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to an owned Rust string, reporting null
/// pointers and invalid UTF-8 as ready-to-return error responses.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
