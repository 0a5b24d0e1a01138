//! qa-harvest: an incremental, batched crawler for Q&A APIs and forums
//!
//! This crate collects questions, answers and owner information from the
//! Stack Exchange API, package metadata from the ROS package index and wiki,
//! and topics from a Discourse forum. It skips everything already present in a previously
//! collected dataset, batches identifiers up to the provider limit, correlates
//! follow-up responses back to their parent records and persists the
//! identifiers the provider failed to return.

pub mod config;
pub mod crawler;
pub mod ids;
pub mod output;
pub mod provider;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for qa-harvest operations
///
/// Only setup and teardown failures surface here. Per-item and per-batch
/// failures are absorbed by the crawler and turned into skips or missing ids.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Identifier extraction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("No identifier pattern matched: {0}")]
    NoMatch(String),
}

/// Result type alias for qa-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for identifier extraction
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, ShutdownHandle};
pub use ids::{Batch, CrawledIds, IdExtractor, SourceRecord};
pub use output::RunSummary;
