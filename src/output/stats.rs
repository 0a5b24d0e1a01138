//! Run summaries and dataset statistics
//!
//! This module provides the end-of-run summary and the `--stats` view of the
//! files a run works with.

use crate::config::{Config, CrawlMode};
use crate::crawler::StopReason;
use crate::ids::CrawledIds;
use crate::provider;
use crate::storage::{read_dataset_urls, read_missing, StorageError};
use crate::HarvestError;
use std::path::Path;
use std::time::Duration;

/// Counters for one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: CrawlMode,

    /// Records handed to the sink
    pub records_emitted: u64,

    /// Identifiers recorded missing
    pub missing: u64,

    /// Source entries skipped because no identifier could be derived
    pub malformed_skipped: u64,

    /// Candidates dropped as already collected or already dispatched
    pub duplicates_skipped: u64,

    /// Identifiers sent in detail requests, plus those resolved directly
    /// from a listing
    pub ids_dispatched: u64,

    /// Identifiers still queued when the run stopped
    pub ids_undispatched: u64,

    pub batches_dispatched: u64,

    /// Listing pages received
    pub pages_fetched: u64,

    /// HTTP requests issued, retries not included
    pub requests: u64,

    /// Throttling responses seen
    pub throttle_hits: u64,

    /// Why the run stopped early, if it did
    pub stop_reason: Option<StopReason>,

    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(mode: CrawlMode) -> Self {
        Self {
            mode,
            records_emitted: 0,
            missing: 0,
            malformed_skipped: 0,
            duplicates_skipped: 0,
            ids_dispatched: 0,
            ids_undispatched: 0,
            batches_dispatched: 0,
            pages_fetched: 0,
            requests: 0,
            throttle_hits: 0,
            stop_reason: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Every dispatched identifier was either emitted or recorded missing
    pub fn is_balanced(&self) -> bool {
        self.records_emitted + self.missing == self.ids_dispatched
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Run Summary ===\n");
    println!("Mode: {:?}", summary.mode);
    println!("Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    if let Some(reason) = summary.stop_reason {
        println!("Stopped: {}", reason);
    }
    println!();

    println!("Records:");
    println!("  Emitted: {}", summary.records_emitted);
    println!("  Missing: {}", summary.missing);
    println!();

    println!("Identifiers:");
    println!("  Dispatched: {}", summary.ids_dispatched);
    println!("  Not dispatched: {}", summary.ids_undispatched);
    println!("  Already collected: {}", summary.duplicates_skipped);
    println!("  Malformed sources: {}", summary.malformed_skipped);
    println!();

    println!("Requests:");
    println!("  Total: {}", summary.requests);
    println!("  Batches: {}", summary.batches_dispatched);
    if summary.pages_fetched > 0 {
        println!("  Listing pages: {}", summary.pages_fetched);
    }
    println!("  Throttled: {}", summary.throttle_hits);

    if !summary.is_balanced() {
        println!();
        println!(
            "Warning: {} emitted + {} missing does not match {} dispatched",
            summary.records_emitted, summary.missing, summary.ids_dispatched
        );
    }
}

/// Counts taken from the files named in a configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetStatistics {
    /// Dataset entries with a URL
    pub dataset_records: usize,

    /// Dataset entries that were skipped
    pub dataset_skipped: usize,

    /// Distinct identifiers in the dataset
    pub unique_ids: usize,

    /// Lines in the records file
    pub new_records: usize,

    /// Entries in the missing-id file; `None` if there is no file yet
    pub missing: Option<usize>,
}

/// Loads statistics for the files named in `config`
///
/// # Returns
///
/// * `Ok(DatasetStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - A file exists but could not be read
pub fn load_statistics(config: &Config) -> Result<DatasetStatistics, HarvestError> {
    let mut stats = DatasetStatistics::default();

    if let Some(path) = &config.input.dataset_path {
        let dataset = read_dataset_urls(Path::new(path), &config.input.url_field)?;
        let extractor = provider::extractor(config);
        stats.dataset_records = dataset.urls.len();
        stats.dataset_skipped = dataset.skipped;
        stats.unique_ids = CrawledIds::from_urls(&dataset.urls, &extractor).len();
    }

    let records_path = Path::new(&config.output.records_path);
    stats.new_records = match std::fs::read_to_string(records_path) {
        Ok(content) => content.lines().filter(|l| !l.trim().is_empty()).count(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
        Err(source) => {
            return Err(StorageError::Read {
                path: records_path.to_path_buf(),
                source,
            }
            .into())
        }
    };

    let missing_path = Path::new(&config.output.missing_path);
    if missing_path.exists() {
        stats.missing = Some(read_missing(missing_path)?.len());
    }

    Ok(stats)
}

/// Prints dataset statistics to stdout
pub fn print_statistics(stats: &DatasetStatistics) {
    println!("=== Dataset Statistics ===\n");
    println!("Dataset:");
    println!("  Records with URL: {}", stats.dataset_records);
    println!("  Skipped entries: {}", stats.dataset_skipped);
    println!("  Unique identifiers: {}", stats.unique_ids);
    println!();
    println!("Output:");
    println!("  Records written: {}", stats.new_records);
    match stats.missing {
        Some(count) => println!("  Missing identifiers: {}", count),
        None => println!("  Missing identifiers: (no file yet)"),
    }
}
