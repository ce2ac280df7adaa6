//! Persistent key-value storage.
//!
//! The login flow writes the auth token; the grade poller owns the grades
//! snapshot. Both go through the same small trait so the agent can run on
//! SQLite while tests run in memory.

use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Well-known store keys.
pub mod keys {
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const GRADES: &str = "grades";
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

const SCHEMA_SQL: &str =
    "CREATE TABLE IF NOT EXISTS kv_store (key TEXT PRIMARY KEY, value TEXT NOT NULL);";

/// SQLite-backed store used by the agent binary.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let db = self.db.lock().unwrap();
        let value = db
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;
        Ok(())
    }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_round_trip_and_overwrite() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get(keys::AUTH_TOKEN).unwrap(), None);

        store.set(keys::AUTH_TOKEN, "first").unwrap();
        assert_eq!(store.get(keys::AUTH_TOKEN).unwrap().as_deref(), Some("first"));

        store.set(keys::AUTH_TOKEN, "second").unwrap();
        assert_eq!(
            store.get(keys::AUTH_TOKEN).unwrap().as_deref(),
            Some("second")
        );
    }

    #[test]
    fn sqlite_preserves_multiline_values() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.set(keys::GRADES, "Math: 85\nPhysics: No grade").unwrap();
        assert_eq!(
            store.get(keys::GRADES).unwrap().as_deref(),
            Some("Math: 85\nPhysics: No grade")
        );
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::default();
        assert_eq!(store.get("missing").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
