use crate::ids::{IdExtractor, SourceRecord};
use std::collections::HashSet;

/// Identifiers already present in the persisted dataset
///
/// Loaded once when a run starts and never modified afterwards; records found
/// during the run are picked up by the next run's load.
#[derive(Debug, Clone, Default)]
pub struct CrawledIds {
    ids: HashSet<String>,
}

impl CrawledIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from dataset URLs; URLs without an identifier are ignored
    pub fn from_urls<I, S>(urls: I, extractor: &IdExtractor) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extracted = extractor.extract_all(urls);
        if !extracted.rejected.is_empty() {
            tracing::warn!(
                "{} dataset URLs had no recognizable identifier",
                extracted.rejected.len()
            );
        }
        extracted
            .records
            .into_iter()
            .map(|r| r.identifier)
            .collect()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.ids.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<String> for CrawledIds {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Keeps the candidates whose identifier is not in `crawled`, in order
pub fn filter_new(crawled: &CrawledIds, candidates: &[SourceRecord]) -> Vec<SourceRecord> {
    candidates
        .iter()
        .filter(|c| !crawled.contains(&c.identifier))
        .cloned()
        .collect()
}

/// Collapses repeated identifiers, keeping the first occurrence
pub fn unique_by_identifier(records: Vec<SourceRecord>) -> Vec<SourceRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.identifier.clone()))
        .collect()
}
