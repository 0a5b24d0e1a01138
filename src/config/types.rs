use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for qa-harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub wiki: WikiConfig,
    #[serde(default)]
    pub forum: ForumConfig,
    #[serde(default)]
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// Which crawl the run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    /// Walk the newest-questions listing and collect questions with answers
    Harvest,
    /// Re-fetch known question URLs and collect owner information
    Revisit,
    /// Read the package index and collect commit time and authors per package
    Index,
    /// Visit the wiki page of every indexed package
    Wiki,
    /// Enumerate the topics of one forum category
    Forum,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    pub mode: CrawlMode,

    /// Maximum number of requests in flight at once
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Hard floor of the inter-request delay (milliseconds)
    #[serde(rename = "minimum-delay")]
    pub minimum_delay: u64,

    /// Ceiling the throttle may back off to (milliseconds)
    #[serde(rename = "maximum-delay")]
    pub maximum_delay: u64,

    /// Delay added for every throttling response (milliseconds)
    #[serde(rename = "throttle-step")]
    pub throttle_step: u64,

    /// Retries allowed per request for transient failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base of the exponential retry backoff (milliseconds)
    #[serde(rename = "retry-delay")]
    pub retry_delay: u64,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Identifiers per batched detail request
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Optional ceiling on listing pages fetched in one run
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,
}

impl CrawlerConfig {
    pub fn minimum_delay(&self) -> Duration {
        Duration::from_millis(self.minimum_delay)
    }

    pub fn maximum_delay(&self) -> Duration {
        Duration::from_millis(self.maximum_delay)
    }

    pub fn throttle_step(&self) -> Duration {
        Duration::from_millis(self.throttle_step)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Stack Exchange API settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL including the API version, e.g. `https://api.stackexchange.com/2.3`
    #[serde(rename = "api-base", default = "default_api_base")]
    pub api_base: String,

    /// Site parameter, e.g. `stackoverflow` or `robotics`
    #[serde(default = "default_site")]
    pub site: String,

    /// Restrict the listing to a tag
    #[serde(default)]
    pub tagged: Option<String>,

    /// Items per listing page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    #[serde(rename = "listing-filter", default = "default_listing_filter")]
    pub listing_filter: String,

    #[serde(rename = "detail-filter", default = "default_detail_filter")]
    pub detail_filter: String,

    /// Fetch answers for harvested questions
    #[serde(rename = "fetch-answers", default = "default_true")]
    pub fetch_answers: bool,

    /// Optional application key (raises the daily quota)
    #[serde(default)]
    pub key: Option<String>,

    /// Path keywords that precede an identifier, in priority order
    #[serde(rename = "id-patterns", default = "default_id_patterns")]
    pub id_patterns: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            site: default_site(),
            tagged: None,
            page_size: default_page_size(),
            listing_filter: default_listing_filter(),
            detail_filter: default_detail_filter(),
            fetch_answers: true,
            key: None,
            id_patterns: default_id_patterns(),
        }
    }
}

/// ROS package index settings (index and wiki modes)
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Site root, e.g. `https://index.ros.org`
    #[serde(default = "default_index_base")]
    pub base: String,

    /// Distribution whose package list is read
    #[serde(default = "default_distro")]
    pub distro: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            base: default_index_base(),
            distro: default_distro(),
        }
    }
}

/// ROS wiki settings (wiki mode)
#[derive(Debug, Clone, Deserialize)]
pub struct WikiConfig {
    /// Site root; package pages live at `{base}/{package}`
    #[serde(default = "default_wiki_base")]
    pub base: String,

    /// Version tabs searched for a package summary, first non-empty wins
    #[serde(default = "default_wiki_versions")]
    pub versions: Vec<String>,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            base: default_wiki_base(),
            versions: default_wiki_versions(),
        }
    }
}

/// Discourse forum settings (forum mode)
#[derive(Debug, Clone, Deserialize)]
pub struct ForumConfig {
    /// Site root, e.g. `https://discourse.openrobotics.org`
    #[serde(default = "default_forum_base")]
    pub base: String,

    /// Category slug to enumerate; an empty slug reads the site-wide latest list
    #[serde(default = "default_forum_category")]
    pub category: String,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            base: default_forum_base(),
            category: default_forum_category(),
        }
    }
}

/// Previously collected data
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Records collected by earlier runs; their identifiers are skipped
    #[serde(rename = "dataset-path", default)]
    pub dataset_path: Option<String>,

    /// Known URLs to revisit (revisit mode) or package pages to visit (wiki mode)
    #[serde(rename = "source-path", default)]
    pub source_path: Option<String>,

    /// Record field holding the source URL
    #[serde(rename = "url-field", default = "default_url_field")]
    pub url_field: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dataset_path: None,
            source_path: None,
            url_field: default_url_field(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// JSON Lines file new records are appended to
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// JSON file listing identifiers the provider did not return
    #[serde(rename = "missing-path")]
    pub missing_path: String,
}

fn default_api_base() -> String {
    "https://api.stackexchange.com/2.3".to_string()
}

fn default_site() -> String {
    "stackoverflow".to_string()
}

fn default_index_base() -> String {
    "https://index.ros.org".to_string()
}

fn default_distro() -> String {
    "humble".to_string()
}

fn default_wiki_base() -> String {
    "https://wiki.ros.org".to_string()
}

fn default_wiki_versions() -> Vec<String> {
    vec!["noetic".to_string(), "melodic".to_string()]
}

fn default_forum_base() -> String {
    "https://discourse.openrobotics.org".to_string()
}

fn default_forum_category() -> String {
    "ng-ros".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_listing_filter() -> String {
    "default".to_string()
}

fn default_detail_filter() -> String {
    "withbody".to_string()
}

fn default_true() -> bool {
    true
}

fn default_id_patterns() -> Vec<String> {
    vec!["questions".to_string(), "question".to_string()]
}

fn default_url_field() -> String {
    "url".to_string()
}
