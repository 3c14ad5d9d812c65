//! SQLite-backed key-value store.
//!
//! One table, one row per logical record. Values are opaque strings (JSON
//! in practice). Writes to the same key are last-write-wins.

use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use weatherly_core::{RusqliteErrorExt, StorageError};

pub type StorageResult<T> = Result<T, StorageError>;

/// Persistent string map.
pub struct KeyValueStore {
    conn: Mutex<Connection>,
}

impl KeyValueStore {
    /// Open (or create) the store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Unavailable(e.to_string()))?;
            }
        }
        let conn = Connection::open(path).map_err(|e| e.into_storage_error())?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        tracing::debug!("Opened key-value store at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (tests and throwaway sessions).
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| e.into_storage_error())?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StorageResult<()> {
        self.conn
            .lock()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                "#,
            )
            .map_err(|e| e.into_storage_error())
    }

    pub fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.conn.lock();
        Self::get_locked(&conn, key)
    }

    fn get_locked(conn: &Connection, key: &str) -> StorageResult<Option<String>> {
        conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|e| e.into_storage_error())
    }

    pub fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.conn.lock();
        Self::set_locked(&conn, key, value)
    }

    fn set_locked(conn: &Connection, key: &str, value: &str) -> StorageResult<()> {
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().timestamp_millis()],
        )
        .map_err(|e| e.into_storage_error())?;
        Ok(())
    }

    /// Read-modify-write under a single lock.
    ///
    /// `f` receives the current value (if any) and returns the new one.
    pub fn update<F>(&self, key: &str, f: F) -> StorageResult<()>
    where
        F: FnOnce(Option<String>) -> StorageResult<String>,
    {
        let conn = self.conn.lock();
        let current = Self::get_locked(&conn, key)?;
        let next = f(current)?;
        Self::set_locked(&conn, key, &next)
    }

    /// Returns whether a row was removed.
    pub fn remove(&self, key: &str) -> StorageResult<bool> {
        let removed = self
            .conn
            .lock()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .map_err(|e| e.into_storage_error())?;
        Ok(removed > 0)
    }

    /// Remove several keys atomically.
    pub fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(|e| e.into_storage_error())?;
        for key in keys {
            tx.execute("DELETE FROM kv WHERE key = ?1", params![key])
                .map_err(|e| e.into_storage_error())?;
        }
        tx.commit().map_err(|e| e.into_storage_error())
    }
}
