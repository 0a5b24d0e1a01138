use crate::config::IndexConfig;
use crate::ids::SourceRecord;
use crate::output::PackageRecord;
use crate::provider::Identified;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// What the index shows for a field it has no value for
const NOT_AVAILABLE: &str = "N/A";

/// Request builder and record mapper for the ROS package index
#[derive(Debug, Clone)]
pub struct RosIndex {
    base: String,
    distro: String,
}

impl RosIndex {
    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            base: config.base.trim_end_matches('/').to_string(),
            distro: config.distro.clone(),
        }
    }

    /// Every package of the configured distribution, in one JSON array
    pub fn packages_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}/search/packages/data.{}.json",
            self.base, self.distro
        ))
    }

    /// Absolute page URL for an index path, without the distribution fragment
    pub fn package_url(&self, path: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("{}/", self.base))?.join(path.trim())?;
        url.set_fragment(None);
        Ok(url)
    }

    /// Turns a listed package into a candidate; `None` if it has no package path
    pub fn source_record(&self, package: &IndexPackage) -> Option<SourceRecord> {
        let identifier = package.identifier();
        if identifier.is_empty() {
            return None;
        }
        let url = self.package_url(&package.url).ok()?;
        Some(SourceRecord::new(identifier, url.as_str()))
    }

    /// Package name from an index URL, an index path or a bare name
    pub fn package_name(&self, entry: &str) -> Option<String> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }
        if !entry.contains('/') {
            return Some(entry.to_string());
        }
        let url = self.package_url(entry).ok()?;
        package_segment(url.path())
    }

    pub fn record(&self, source: &SourceRecord, package: &IndexPackage) -> PackageRecord {
        PackageRecord {
            url: source.source_url.clone(),
            time: package.time(),
            user: package.authors(),
        }
    }
}

/// One entry of the index package list
#[derive(Debug, Clone, Deserialize)]
pub struct IndexPackage {
    #[serde(default)]
    pub name: Option<String>,

    /// Site-relative path such as `/p/tf2/#humble`
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub last_commit_time: Value,

    /// A list of names, a single string, or absent
    #[serde(default)]
    pub authors: Value,
}

impl IndexPackage {
    /// Last commit time as the index reports it
    pub fn time(&self) -> String {
        match &self.last_commit_time {
            Value::String(time) => time.clone(),
            Value::Null => NOT_AVAILABLE.to_string(),
            other => other.to_string(),
        }
    }

    /// Authors joined with `", "`
    pub fn authors(&self) -> String {
        match &self.authors {
            Value::Array(names) => names
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            Value::String(name) => name.clone(),
            _ => NOT_AVAILABLE.to_string(),
        }
    }
}

impl Identified for IndexPackage {
    /// The path segment after `/p/`; empty for non-package entries
    fn identifier(&self) -> String {
        let path = self.url.split('#').next().unwrap_or_default();
        package_segment(path).unwrap_or_default()
    }
}

fn package_segment(path: &str) -> Option<String> {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    segments.find(|s| *s == "p")?;
    segments.next().map(str::to_string)
}
