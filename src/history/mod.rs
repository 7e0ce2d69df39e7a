//! History — recent route searches.
//!
//! Submodules:
//! - `store`: `HistoryStore` contract, SQLite key-value and in-memory stores
//! - `route_history`: the capped, most-recent-first list the dispatcher uses
//! - `types`: `RouteSearchRecord`
//! - `errors`: history error types

pub mod errors;
pub mod route_history;
pub mod store;
pub mod types;

pub use errors::HistoryError;
pub use route_history::RouteHistory;
pub use store::{HistoryStore, MemoryHistoryStore, SqliteHistoryStore};
pub use types::RouteSearchRecord;
