use crate::storage::{StorageError, StorageResult};
use serde_json::Value;
use std::path::Path;

/// Source URLs read from a dataset file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetUrls {
    /// URLs in file order
    pub urls: Vec<String>,

    /// Entries that were skipped (undecodable line or no URL field)
    pub skipped: usize,
}

/// Reads the URL of every record in a dataset file
///
/// Two layouts are accepted: a single JSON array, or JSON Lines with one
/// record per line. A record is either an object carrying `url_field` or a
/// bare URL string. Bad entries are skipped and counted; an unreadable file
/// or an undecodable array is an error.
///
/// # Arguments
///
/// * `path` - Path to the dataset file
/// * `url_field` - Name of the field holding the URL
pub fn read_dataset_urls(path: &Path, url_field: &str) -> StorageResult<DatasetUrls> {
    let content = std::fs::read_to_string(path).map_err(|source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        let entries: Vec<Value> =
            serde_json::from_str(trimmed).map_err(|e| StorageError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        return Ok(collect_urls(entries, url_field));
    }

    let mut dataset = DatasetUrls::default();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(entry) => match url_of(&entry, url_field) {
                Some(url) => dataset.urls.push(url),
                None => {
                    tracing::warn!("{}:{} has no '{}' field", path.display(), index + 1, url_field);
                    dataset.skipped += 1;
                }
            },
            Err(e) => {
                tracing::warn!("{}:{} is not valid JSON: {}", path.display(), index + 1, e);
                dataset.skipped += 1;
            }
        }
    }

    Ok(dataset)
}

fn collect_urls(entries: Vec<Value>, url_field: &str) -> DatasetUrls {
    let mut dataset = DatasetUrls::default();
    for entry in &entries {
        match url_of(entry, url_field) {
            Some(url) => dataset.urls.push(url),
            None => dataset.skipped += 1,
        }
    }
    if dataset.skipped > 0 {
        tracing::warn!(
            "{} dataset entries had no '{}' field",
            dataset.skipped,
            url_field
        );
    }
    dataset
}

fn url_of(entry: &Value, url_field: &str) -> Option<String> {
    match entry {
        Value::String(url) => Some(url.clone()),
        Value::Object(fields) => fields
            .get(url_field)
            .and_then(Value::as_str)
            .filter(|url| !url.trim().is_empty())
            .map(str::to_string),
        _ => None,
    }
}
