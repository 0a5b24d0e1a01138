//! Provider responses
//!
//! Every body coming back from a provider is interpreted into a tagged
//! `ProviderResponse` so the crawler never has to guess what an absent field
//! means. Transport failures from the fetcher are folded into the same type.
//!
//! Providers:
//! - `StackExchange`: question listings, batched details and answers
//! - `RosIndex`: the package list of one distribution
//! - `RosWiki`: package pages
//! - `Discourse`: category lookup, topic listings and topics

mod discourse;
mod rosindex;
mod roswiki;
mod stackexchange;

pub use discourse::{
    parse_categories, parse_topic_list, Discourse, ForumCategory, ForumPost, ForumTopic,
    TopicSummary,
};
pub use rosindex::{IndexPackage, RosIndex};
pub use roswiki::{RosWiki, WikiPage};
pub use stackexchange::{ApiAnswer, ApiOwner, ApiQuestion, StackExchange};

use crate::config::{Config, CrawlMode};
use crate::crawler::FetchFailure;
use crate::ids::{IdExtractor, IdKind};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;

/// Items carrying the identifier the provider assigned to them
pub trait Identified {
    fn identifier(&self) -> String;
}

/// Paging and quota information present on every successful body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageMeta {
    /// More results exist beyond this page
    pub has_more: bool,
    /// Requests left in the daily quota, if reported
    pub quota_remaining: Option<i64>,
    /// Seconds the provider asks us to wait before the next call
    pub backoff: Option<u64>,
}

/// A non-empty page of items
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

/// Why a response could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The daily quota is used up
    QuotaExhausted,
    /// The provider reported a throttle violation
    Throttled { message: String },
    /// The provider returned an error body
    Api {
        id: u32,
        name: String,
        message: String,
    },
    /// The body could not be decoded
    Malformed(String),
    /// The request never produced a usable body
    Transport(FetchFailure),
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuotaExhausted => write!(f, "request quota exhausted"),
            Self::Throttled { message } => write!(f, "throttle violation: {}", message),
            Self::Api { id, name, message } => write!(f, "API error {} ({}): {}", id, name, message),
            Self::Malformed(e) => write!(f, "malformed response body: {}", e),
            Self::Transport(failure) => write!(f, "{}", failure),
        }
    }
}

/// Interpreted provider response
#[derive(Debug, Clone)]
pub enum ProviderResponse<T> {
    Success(Page<T>),
    EmptyPage(PageMeta),
    ProviderError(ProviderErrorKind),
}

impl<T> ProviderResponse<T> {
    /// Paging metadata, when the body was decoded
    pub fn meta(&self) -> Option<PageMeta> {
        match self {
            Self::Success(page) => Some(page.meta),
            Self::EmptyPage(meta) => Some(*meta),
            Self::ProviderError(_) => None,
        }
    }

    /// Converts every item, keeping the paging metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> ProviderResponse<U> {
        match self {
            Self::Success(page) => ProviderResponse::Success(Page {
                items: page.items.into_iter().map(f).collect(),
                meta: page.meta,
            }),
            Self::EmptyPage(meta) => ProviderResponse::EmptyPage(meta),
            Self::ProviderError(kind) => ProviderResponse::ProviderError(kind),
        }
    }
}

/// Wire shape shared by all Stack Exchange responses
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    quota_remaining: Option<i64>,
    #[serde(default)]
    backoff: Option<u64>,
    #[serde(default)]
    error_id: Option<u32>,
    #[serde(default)]
    error_name: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Error bodies carry no items, so they are decoded without an item type
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_id: u32,
    #[serde(default)]
    error_name: String,
    #[serde(default)]
    error_message: String,
}

/// Extractor matching the URLs the configured mode records
///
/// Dataset URLs go through the same extractor, so identifiers found in a
/// previous run's output line up with the ones a new run discovers.
pub fn extractor(config: &Config) -> IdExtractor {
    match config.crawler.mode {
        CrawlMode::Harvest | CrawlMode::Revisit => {
            IdExtractor::new(config.provider.id_patterns.iter().cloned())
        }
        CrawlMode::Index => IdExtractor::with_kind(["p"], IdKind::Name),
        CrawlMode::Wiki => IdExtractor::last_segment(IdKind::Name),
        CrawlMode::Forum => IdExtractor::last_segment(IdKind::Numeric),
    }
}

/// Identifiers per detail request for the configured mode
///
/// Wiki pages and forum topics are fetched one per request.
pub fn batch_limit(config: &Config) -> usize {
    match config.crawler.mode {
        CrawlMode::Wiki | CrawlMode::Forum => 1,
        CrawlMode::Harvest | CrawlMode::Revisit | CrawlMode::Index => config.crawler.batch_size,
    }
}

/// Interprets the outcome of a Stack Exchange fetch
pub fn interpret<T: DeserializeOwned>(
    result: Result<String, FetchFailure>,
) -> ProviderResponse<T> {
    interpret_with(result, parse_body::<T>)
}

/// Interprets the outcome of a fetch, decoding a successful body with `parse`
///
/// Rejected requests whose body is a Stack Exchange error envelope become
/// `Api` or `Throttled` errors; every other failure is a transport error.
pub fn interpret_with<T, F>(result: Result<String, FetchFailure>, parse: F) -> ProviderResponse<T>
where
    F: FnOnce(&str) -> ProviderResponse<T>,
{
    match result {
        Ok(body) => parse(&body),
        Err(FetchFailure::Rejected {
            status,
            body: Some(body),
        }) => match serde_json::from_str::<ErrorBody>(&body) {
            Ok(error) => ProviderResponse::ProviderError(api_error(
                error.error_id,
                error.error_name,
                error.error_message,
            )),
            Err(_) => ProviderResponse::ProviderError(ProviderErrorKind::Transport(
                FetchFailure::Rejected {
                    status,
                    body: Some(body),
                },
            )),
        },
        Err(failure) => ProviderResponse::ProviderError(ProviderErrorKind::Transport(failure)),
    }
}

/// Parses a successful response body
pub fn parse_body<T: DeserializeOwned>(body: &str) -> ProviderResponse<T> {
    let envelope: Envelope<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            return ProviderResponse::ProviderError(ProviderErrorKind::Malformed(e.to_string()))
        }
    };

    if let Some(id) = envelope.error_id {
        return ProviderResponse::ProviderError(api_error(
            id,
            envelope.error_name.unwrap_or_default(),
            envelope.error_message.unwrap_or_default(),
        ));
    }

    let meta = PageMeta {
        has_more: envelope.has_more,
        quota_remaining: envelope.quota_remaining,
        backoff: envelope.backoff,
    };

    if envelope.items.is_empty() {
        if meta.quota_remaining == Some(0) {
            return ProviderResponse::ProviderError(ProviderErrorKind::QuotaExhausted);
        }
        return ProviderResponse::EmptyPage(meta);
    }

    ProviderResponse::Success(Page {
        items: envelope.items,
        meta,
    })
}

/// Parses a body that is a bare JSON array of items
///
/// Such listings are complete in one response.
pub fn parse_array<T: DeserializeOwned>(body: &str) -> ProviderResponse<T> {
    match serde_json::from_str::<Vec<T>>(body) {
        Ok(items) if items.is_empty() => ProviderResponse::EmptyPage(PageMeta::default()),
        Ok(items) => ProviderResponse::Success(Page {
            items,
            meta: PageMeta::default(),
        }),
        Err(e) => ProviderResponse::ProviderError(ProviderErrorKind::Malformed(e.to_string())),
    }
}

/// Parses a body holding exactly one item
pub fn parse_single<T: DeserializeOwned>(body: &str) -> ProviderResponse<T> {
    match serde_json::from_str::<T>(body) {
        Ok(item) => ProviderResponse::Success(Page {
            items: vec![item],
            meta: PageMeta::default(),
        }),
        Err(e) => ProviderResponse::ProviderError(ProviderErrorKind::Malformed(e.to_string())),
    }
}

fn api_error(id: u32, name: String, message: String) -> ProviderErrorKind {
    if name == "throttle_violation" {
        ProviderErrorKind::Throttled { message }
    } else {
        ProviderErrorKind::Api { id, name, message }
    }
}
