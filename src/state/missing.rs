use crate::ids::SourceRecord;
use crate::storage::{write_missing, StorageResult};
use std::collections::HashSet;
use std::path::Path;

/// Identifiers that were dispatched but never came back as records
///
/// Append-only for the life of a run, kept in the order misses were reported.
/// Written out exactly once by `persist` when the run ends.
#[derive(Debug, Default)]
pub struct MissingIds {
    entries: Vec<SourceRecord>,
    seen: HashSet<String>,
}

impl MissingIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a miss; returns false if the identifier was already recorded
    pub fn record(&mut self, record: SourceRecord) -> bool {
        if !self.seen.insert(record.identifier.clone()) {
            tracing::debug!("Identifier {} already recorded missing", record.identifier);
            return false;
        }
        self.entries.push(record);
        true
    }

    /// Records every miss in order; returns how many were new
    pub fn extend<I: IntoIterator<Item = SourceRecord>>(&mut self, records: I) -> usize {
        records
            .into_iter()
            .map(|r| self.record(r))
            .filter(|added| *added)
            .count()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.seen.contains(identifier)
    }

    pub fn entries(&self) -> &[SourceRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the accumulated misses to `path`, replacing the previous file
    pub fn persist(&self, path: &Path) -> StorageResult<()> {
        write_missing(path, &self.entries)
    }
}
