//! RouteHistory — the capped, most-recent-first list of route searches.

use chrono::{DateTime, Utc};

use super::errors::HistoryError;
use super::store::HistoryStore;
use super::types::RouteSearchRecord;

/// Records kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 10;

/// In-memory list mirrored to a [`HistoryStore`].
///
/// Records are only ever prepended, read, or cleared as a whole; an insert
/// past capacity evicts the oldest entry.
pub struct RouteHistory {
    store: Box<dyn HistoryStore>,
    records: Vec<RouteSearchRecord>,
    capacity: usize,
}

impl RouteHistory {
    /// Load the persisted list. A store that cannot be read starts empty.
    pub fn open(store: Box<dyn HistoryStore>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut records = match store.load() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load route history, starting empty");
                Vec::new()
            }
        };
        records.truncate(capacity);

        tracing::debug!(count = records.len(), capacity, "route history loaded");
        Self {
            store,
            records,
            capacity,
        }
    }

    /// Prepend a search and persist the list.
    ///
    /// A failed save is logged; the in-memory list still holds the record.
    pub fn record(&mut self, start: &str, end: &str, at: DateTime<Utc>) -> RouteSearchRecord {
        let record = RouteSearchRecord::new(start, end, at);
        self.records.insert(0, record.clone());
        self.records.truncate(self.capacity);

        if let Err(e) = self.store.save(&self.records) {
            tracing::warn!(error = %e, "failed to save route history");
        }
        tracing::info!(start, end, count = self.records.len(), "route search recorded");
        record
    }

    /// Records, most recent first.
    pub fn recent(&self) -> &[RouteSearchRecord] {
        &self.records
    }

    pub fn find(&self, id: &str) -> Option<&RouteSearchRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove every record from memory and from the store.
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        self.store.clear()?;
        self.records.clear();
        tracing::info!("route history cleared");
        Ok(())
    }
}
