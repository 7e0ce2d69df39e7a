//! History persistence behind a small key-value contract.
//!
//! The SQLite store keeps the whole list as one JSON value under the
//! `mapHistory` key, matching the mobile client's storage layout.

use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::errors::HistoryError;
use super::types::RouteSearchRecord;

/// Key under which the serialized list is stored.
pub const HISTORY_KEY: &str = "mapHistory";

/// Persistence for recent route searches.
///
/// `load` returns records most recent first. Nothing beyond "saved before
/// the next load in the same session" is assumed about durability.
pub trait HistoryStore: Send {
    fn load(&self) -> Result<Vec<RouteSearchRecord>, HistoryError>;
    fn save(&self, records: &[RouteSearchRecord]) -> Result<(), HistoryError>;
    fn clear(&self) -> Result<(), HistoryError>;
}

// ─── SQLite ─────────────────────────────────────────────────────────────────

/// Key-value table in a SQLite database.
pub struct SqliteHistoryStore {
    conn: Connection,
}

impl SqliteHistoryStore {
    /// Open (or create) the store at the given path.
    ///
    /// Pass `":memory:"` for an in-memory database (tests).
    pub fn open(path: &str) -> Result<Self, HistoryError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(Self { conn })
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn load(&self) -> Result<Vec<RouteSearchRecord>, HistoryError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![HISTORY_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, records: &[RouteSearchRecord]) -> Result<(), HistoryError> {
        let json = serde_json::to_string(records)?;
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                            updated_at = datetime('now')",
            params![HISTORY_KEY, json],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<(), HistoryError> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![HISTORY_KEY])?;
        Ok(())
    }
}

// ─── Memory ─────────────────────────────────────────────────────────────────

/// Process-local store, for ephemeral sessions and tests.
#[derive(Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<RouteSearchRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RouteSearchRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Vec<RouteSearchRecord>, HistoryError> {
        Ok(self.lock().clone())
    }

    fn save(&self, records: &[RouteSearchRecord]) -> Result<(), HistoryError> {
        *self.lock() = records.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<(), HistoryError> {
        self.lock().clear();
        Ok(())
    }
}
