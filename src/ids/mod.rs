//! Identifier handling for qa-harvest
//!
//! This module turns source URLs into provider identifiers and prepares them
//! for batched requests:
//! - `IdExtractor` derives identifiers from URLs
//! - `CrawledIds` and `filter_new` drop identifiers collected by earlier runs
//! - `into_batches` groups pending identifiers under the provider batch limit

mod batch;
mod dedup;
mod extract;

pub use batch::{into_batches, Batch};
pub use dedup::{filter_new, unique_by_identifier, CrawledIds};
pub use extract::{Extracted, IdExtractor, IdKind};

use serde::{Deserialize, Serialize};

/// One known resource: the provider identifier and the URL it came from
///
/// Serialized as `{"identifier": ..., "sourceUrl": ...}` in the missing-id file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    pub identifier: String,
    pub source_url: String,
}

impl SourceRecord {
    pub fn new(identifier: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            source_url: source_url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_record_wire_format() {
        let record = SourceRecord::new("42", "https://stackoverflow.com/questions/42/x");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"identifier":"42","sourceUrl":"https://stackoverflow.com/questions/42/x"}"#
        );
    }
}
