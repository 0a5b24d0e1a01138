//! Crawler module for batched, correlating API crawls
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with throttling and bounded retries
//! - Request scheduling with request-scoped context
//! - Correlating batched responses back to their identifiers
//! - Listing pagination
//! - HTML body cleaning
//! - Overall crawl coordination

mod context;
mod coordinator;
mod correlator;
mod fetcher;
mod pagination;
mod parser;
mod scheduler;

pub use context::{PartialRecord, RequestContext};
pub use coordinator::{
    load_crawled_ids, plan_sources, run_crawl, Coordinator, ShutdownHandle, SourcePlan,
};
pub use correlator::{correlate, Correlation};
pub use fetcher::{build_http_client, fetch_once, fetch_with_retry, FetchFailure, FetchReport};
pub use pagination::{PageReport, PaginationDriver, PaginationState, StopReason};
pub use parser::{BlockKind, BodyCleaner, HtmlCleaner};
pub use scheduler::{Completion, Scheduler};

use crate::config::Config;
use crate::output::RunSummary;
use crate::HarvestError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load the identifiers collected by earlier runs
/// 2. Build the HTTP client
/// 3. Paginate the listing or read the revisit sources
/// 4. Fetch batched details and answer follow-ups
/// 5. Append records and write the missing-identifier file
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(RunSummary)` - Crawl completed
/// * `Err(HarvestError)` - Setup or teardown I/O failed
pub async fn crawl(config: Config) -> Result<RunSummary, HarvestError> {
    run_crawl(config, ShutdownHandle::new()).await
}
