//! Output module for emitted records and run reporting
//!
//! This module handles:
//! - The record shapes each crawl mode emits
//! - Writing records through a `RecordSink`
//! - Run summaries and dataset statistics

mod jsonl;
mod records;
pub mod stats;
mod traits;

pub use jsonl::{JsonLinesSink, MemorySink};
pub use records::{
    format_timestamp, OutputRecord, OwnerRecord, PackageRecord, QuestionRecord, TopicRecord,
    WikiRecord, TIME_FORMAT,
};
pub use stats::{
    load_statistics, print_statistics, print_summary, DatasetStatistics, RunSummary,
};
pub use traits::{OutputError, OutputResult, RecordSink};
