use crate::classify::AlertSet;
use crate::types::Snapshot;
use serde::{Deserialize, Serialize};

/// Everything recorded for one tick: the snapshot, its classification, and
/// the derived suggestions. Never mutated after append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub snapshot: Snapshot,
    pub alerts: AlertSet,
    pub suggestions: Vec<String>,
}

/// Run-scoped append-only log of history records.
///
/// Exclusively owned by the monitoring loop for the duration of one run, so
/// no locking. Durability and size limits are the persistence collaborator's
/// concern, not this store's.
#[derive(Debug, Default)]
pub struct HistoryStore {
    records: Vec<HistoryRecord>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: HistoryRecord) {
        self.records.push(record);
    }

    pub fn all(&self) -> &[HistoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Reset for a fresh monitoring run.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
