use crate::ids::SourceRecord;
use crate::storage::{StorageError, StorageResult};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes the missing-identifier file, replacing any previous one
///
/// The entries go to a temporary file in the same directory which is then
/// renamed over `path`, so readers never see a half-written file.
pub fn write_missing(path: &Path, entries: &[SourceRecord]) -> StorageResult<()> {
    let write_error = |source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_error)?;

    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    serde_json::to_writer_pretty(&mut file, entries)?;
    file.write_all(b"\n").map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    tracing::debug!("Wrote {} missing identifiers to {}", entries.len(), path.display());
    Ok(())
}

/// Reads a missing-identifier file written by `write_missing`
pub fn read_missing(path: &Path) -> StorageResult<Vec<SourceRecord>> {
    let content = std::fs::read_to_string(path).map_err(|source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| StorageError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
