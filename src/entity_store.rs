//! Generic entity persistence over a single redb table.
//!
//! Every collection is stored as one serialized JSON array under its entity
//! name, in a flat key namespace shared with the auth keys (`Users`,
//! `AuditLog`, `auth_session`). The store is entity-agnostic: records are
//! arbitrary JSON objects and no field other than `id` carries any meaning
//! here.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use log::{info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use redb::{Database, ReadableTable, TableDefinition};
use serde_json::Value as JsonValue;

use crate::app_response::AppResponse;
use crate::model::Record;
use crate::seed;

const COLLECTIONS: TableDefinition<&str, &str> = TableDefinition::new("collections");

/// Result of loading a persisted collection. A missing key is distinct from
/// an unreadable one: only a missing collection may be seeded, a corrupt blob
/// degrades to empty.
enum Stored {
    Missing,
    Records(Vec<JsonValue>),
}

pub struct EntityStore {
    db: Database,
    // redb serializes its own write transactions, but every compound
    // operation here is a read-modify-write across two transactions. The
    // lock keeps at most one writer inside that window when the host calls
    // in from more than one thread.
    write_lock: Mutex<()>,
}

impl EntityStore {
    /// Opens (or creates) the backing database file and makes sure the
    /// collections table exists so reads on a fresh file never fail.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, AppResponse> {
        let db = Database::create(path.as_ref())?;
        let txn = db.begin_write()?;
        {
            txn.open_table(COLLECTIONS)?;
        }
        txn.commit()?;
        info!("Entity store opened at {}", path.as_ref().display());

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    /// Full collection in stored order. First access of a never-initialized
    /// entity writes its seed (when one exists) and returns it; entities
    /// without a seed start empty.
    pub fn list(&self, entity: &str) -> Result<Vec<JsonValue>, AppResponse> {
        let _guard = self.write_guard();
        self.list_unlocked(entity)
    }

    /// Subset of [`list`](Self::list) where every criterion field loosely
    /// equals the record's field. Empty criteria returns the full collection;
    /// a record missing a criterion field never matches.
    pub fn filter(&self, entity: &str, criteria: &Record) -> Result<Vec<JsonValue>, AppResponse> {
        let _guard = self.write_guard();
        let records = self.list_unlocked(entity)?;
        Ok(records
            .into_iter()
            .filter(|record| matches_criteria(record, criteria))
            .collect())
    }

    /// Appends a new record with a freshly minted `id` and returns it.
    ///
    /// The minted `id` goes first and the caller's fields are merged over
    /// it, so a caller-supplied `id` wins. Mutation paths never seed: an
    /// uninitialized collection starts from empty here.
    pub fn create(&self, entity: &str, fields: Record) -> Result<JsonValue, AppResponse> {
        let _guard = self.write_guard();
        let mut records = self.load_or_empty(entity)?;
        let record = new_record(fields);
        records.push(record.clone());
        self.store(entity, &records)?;
        Ok(record)
    }

    /// Same as repeated [`create`](Self::create) but as a single persisted
    /// write. Every element gets its own id; input order is preserved.
    pub fn bulk_create(
        &self,
        entity: &str,
        fields_list: Vec<Record>,
    ) -> Result<Vec<JsonValue>, AppResponse> {
        let _guard = self.write_guard();
        let mut records = self.load_or_empty(entity)?;
        let new_records: Vec<JsonValue> = fields_list.into_iter().map(new_record).collect();
        records.extend(new_records.iter().cloned());
        self.store(entity, &records)?;
        Ok(new_records)
    }

    /// Shallow-merges `patch` over the record with the given id and returns
    /// the updated record, or `None` (with no write) when the id is absent.
    pub fn update(
        &self,
        entity: &str,
        id: &str,
        patch: Record,
    ) -> Result<Option<JsonValue>, AppResponse> {
        let _guard = self.write_guard();
        let mut records = self.load_or_empty(entity)?;

        let position = records.iter().position(|record| record_id_is(record, id));
        let Some(position) = position else {
            return Ok(None);
        };

        if let JsonValue::Object(fields) = &mut records[position] {
            fields.extend(patch);
        }
        let updated = records[position].clone();
        self.store(entity, &records)?;
        Ok(Some(updated))
    }

    /// Removes the record with the given id if present. Always returns
    /// `true`; deleting an id twice is not an error.
    pub fn delete(&self, entity: &str, id: &str) -> Result<bool, AppResponse> {
        let _guard = self.write_guard();
        let mut records = self.load_or_empty(entity)?;
        records.retain(|record| !record_id_is(record, id));
        self.store(entity, &records)?;
        Ok(true)
    }

    fn list_unlocked(&self, entity: &str) -> Result<Vec<JsonValue>, AppResponse> {
        match self.load(entity)? {
            Stored::Records(records) => Ok(records),
            Stored::Missing => match seed::seed_for(entity) {
                Some(records) => {
                    info!("Seeding collection '{entity}' with {} records", records.len());
                    self.store(entity, &records)?;
                    Ok(records)
                }
                None => Ok(Vec::new()),
            },
        }
    }

    fn load(&self, entity: &str) -> Result<Stored, AppResponse> {
        match self.get_raw(entity)? {
            None => Ok(Stored::Missing),
            Some(blob) => match serde_json::from_str::<Vec<JsonValue>>(&blob) {
                Ok(records) => Ok(Stored::Records(records)),
                Err(e) => {
                    warn!("Corrupt collection '{entity}', treating as empty: {e}");
                    Ok(Stored::Records(Vec::new()))
                }
            },
        }
    }

    fn load_or_empty(&self, entity: &str) -> Result<Vec<JsonValue>, AppResponse> {
        match self.load(entity)? {
            Stored::Records(records) => Ok(records),
            Stored::Missing => Ok(Vec::new()),
        }
    }

    fn store(&self, entity: &str, records: &[JsonValue]) -> Result<(), AppResponse> {
        let blob = serde_json::to_string(records)?;
        self.put_raw(entity, &blob)
    }

    /// Serializes compound read-modify-write operations. Shared with the auth
    /// store, which appends to collections in the same namespace.
    pub(crate) fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn get_raw(&self, key: &str) -> Result<Option<String>, AppResponse> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(COLLECTIONS)?;
        let value = table.get(key)?.map(|guard| guard.value().to_string());
        Ok(value)
    }

    pub(crate) fn put_raw(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(COLLECTIONS)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    pub(crate) fn remove_raw(&self, key: &str) -> Result<(), AppResponse> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(COLLECTIONS)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }
}

fn new_record(fields: Record) -> JsonValue {
    let mut record = Record::new();
    record.insert("id".to_string(), JsonValue::String(mint_id()));
    record.extend(fields);
    JsonValue::Object(record)
}

fn record_id_is(record: &JsonValue, id: &str) -> bool {
    record.get("id").and_then(JsonValue::as_str) == Some(id)
}

fn matches_criteria(record: &JsonValue, criteria: &Record) -> bool {
    criteria.iter().all(|(key, expected)| {
        record
            .get(key)
            .map_or(false, |actual| loose_eq(actual, expected))
    })
}

/// Epoch millis plus a 7-character alphanumeric suffix. 62^7 suffixes per
/// millisecond keeps collision odds negligible for a single-writer store.
fn mint_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect();
    format!("{}{}", millis, suffix.to_lowercase())
}

/// Loose (coercing) equality between a record field and a criterion value,
/// mirroring the `==` matching the UI already depends on: numbers, strings
/// and booleans coerce to numbers when the types differ, while arrays and
/// objects compare structurally.
fn loose_eq(field: &JsonValue, criterion: &JsonValue) -> bool {
    use JsonValue::{Array, Bool, Null, Number, Object, String as JsonString};

    match (field, criterion) {
        (Null, Null) => true,
        (Bool(a), Bool(b)) => a == b,
        (Number(a), Number(b)) => a.as_f64() == b.as_f64(),
        (JsonString(a), JsonString(b)) => a == b,
        (Number(n), JsonString(s)) | (JsonString(s), Number(n)) => {
            string_to_number(s) == n.as_f64()
        }
        (Bool(b), Number(n)) | (Number(n), Bool(b)) => n.as_f64() == Some(bool_to_number(*b)),
        (Bool(b), JsonString(s)) | (JsonString(s), Bool(b)) => {
            string_to_number(s) == Some(bool_to_number(*b))
        }
        (Array(a), Array(b)) => a == b,
        (Object(a), Object(b)) => a == b,
        _ => false,
    }
}

fn bool_to_number(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

// Empty and whitespace-only strings coerce to zero, like Number("").
fn string_to_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok()
}
