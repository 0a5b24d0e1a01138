//! Record sink trait and error types
//!
//! This module defines the trait interface for record sinks and the
//! associated error type.

use crate::output::OutputRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to format record: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for emitted records
///
/// Records arrive one at a time as they are finalized; `flush` is called once
/// when the run has drained.
pub trait RecordSink: Send {
    /// Writes one finalized record
    fn emit(&mut self, record: &OutputRecord) -> OutputResult<()>;

    /// Makes everything emitted so far durable
    fn flush(&mut self) -> OutputResult<()>;
}
