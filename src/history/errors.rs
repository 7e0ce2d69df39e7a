//! History error types.

use thiserror::Error;

/// Errors from the history store.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Database operation failed.
    #[error("database error: {reason}")]
    DatabaseError { reason: String },

    /// Stored history could not be (de)serialized.
    #[error("serialization error: {reason}")]
    SerializationError { reason: String },
}

impl From<rusqlite::Error> for HistoryError {
    fn from(e: rusqlite::Error) -> Self {
        HistoryError::DatabaseError {
            reason: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(e: serde_json::Error) -> Self {
        HistoryError::SerializationError {
            reason: e.to_string(),
        }
    }
}
