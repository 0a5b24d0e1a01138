use crate::output::{OutputError, OutputRecord, OutputResult, RecordSink};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Appends records to a JSON Lines file
///
/// The file can be used directly as the `dataset-path` of the next run.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl JsonLinesSink {
    /// Opens `path` for appending, creating it and its directories if needed
    pub fn open(path: &Path) -> OutputResult<Self> {
        let open_error = |source| OutputError::Open {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(open_error)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_error)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written through this sink
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl RecordSink for JsonLinesSink {
    fn emit(&mut self, record: &OutputRecord) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }
}

/// Keeps records in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<OutputRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn records(&self) -> Vec<OutputRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl RecordSink for MemorySink {
    fn emit(&mut self, record: &OutputRecord) -> OutputResult<()> {
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }
}
