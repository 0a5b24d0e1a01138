use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Layout of the `time` field
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A harvested question joined with its answers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub title: String,
    pub time: String,
    pub post_content: Vec<String>,
    pub question_code: Vec<String>,
    pub quote: Vec<String>,
    pub question_details: Vec<String>,
    pub url: String,
    pub answer: Vec<String>,
    pub answer_code: Vec<String>,
}

/// Owner information for a revisited question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRecord {
    pub url: String,
    /// Display name of the owner; null when the owner account is gone
    pub user: Option<String>,
}

/// A package page from the ROS wiki
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiRecord {
    pub url: String,
    pub package: String,
    pub package_summary: Vec<String>,
    pub package_details: Vec<String>,
}

/// A forum topic with the text of all its posts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRecord {
    pub title: String,
    pub url: String,
    pub thread_contents: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thread_details: Vec<String>,
}

/// Last commit and authors of an indexed package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub url: String,
    pub time: String,
    /// Authors joined with `", "`, or `N/A`
    pub user: String,
}

/// Any record a run emits
///
/// Variants are tried in order when reading a dataset back, so the ones with
/// more required fields come first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputRecord {
    Question(QuestionRecord),
    Wiki(WikiRecord),
    Topic(TopicRecord),
    Package(PackageRecord),
    Owner(OwnerRecord),
}

impl OutputRecord {
    /// Source URL the record was collected from
    pub fn url(&self) -> &str {
        match self {
            Self::Question(record) => &record.url,
            Self::Wiki(record) => &record.url,
            Self::Topic(record) => &record.url,
            Self::Package(record) => &record.url,
            Self::Owner(record) => &record.url,
        }
    }
}

/// Formats Unix seconds as UTC `YYYY-MM-DD HH:MM:SS`
///
/// Out-of-range timestamps format as an empty string.
pub fn format_timestamp(seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|time| time.format(TIME_FORMAT).to_string())
        .unwrap_or_default()
}
