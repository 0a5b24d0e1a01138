//! Storage module for the flat files a run reads and writes
//!
//! This module handles:
//! - Loading source URLs from the previously collected dataset
//! - Writing and reading the missing-identifier file
//!
//! Failures here are fatal for a run: without the dataset the crawler cannot
//! tell what is new, and without the missing file the run's bookkeeping is lost.

mod dataset;
mod missing_file;

pub use dataset::{read_dataset_urls, DatasetUrls};
pub use missing_file::{read_missing, write_missing};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing run files
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
