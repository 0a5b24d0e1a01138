//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests against the provider API
//! - Retry logic for transient failures
//! - Error classification

use crate::config::UserAgentConfig;
use crate::state::{RetryPolicy, Throttle};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

/// Terminal outcome of a request that produced no usable body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// The request did not complete within the timeout
    #[error("request timed out")]
    Timeout,

    /// HTTP 5xx
    #[error("server error (HTTP {status})")]
    ServerError { status: u16 },

    /// HTTP 429
    #[error("throttled (HTTP 429)")]
    Throttled,

    /// Any other non-success status; the body is kept for error envelopes
    #[error("rejected (HTTP {status})")]
    Rejected { status: u16, body: Option<String> },

    /// Connection refused, TLS failure and similar
    #[error("network error: {error}")]
    Network { error: String },

    /// The request task ended without reporting back
    #[error("request aborted")]
    Aborted,
}

impl FetchFailure {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ServerError { .. } | Self::Throttled
        )
    }
}

/// Outcome of a request after retries
#[derive(Debug)]
pub struct FetchReport {
    pub result: Result<String, FetchFailure>,
    /// Attempts made, including the first
    pub attempts: u32,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use qa_harvest::config::UserAgentConfig;
/// use qa_harvest::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "qa-harvest".to_string(),
///     crawler_version: "0.1".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends one GET request and classifies the outcome
pub async fn fetch_once(client: &Client, url: &Url) -> Result<String, FetchFailure> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(classify_error)?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchFailure::Throttled);
    }
    if status.is_server_error() {
        return Err(FetchFailure::ServerError {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(FetchFailure::Rejected {
            status: status.as_u16(),
            body: response.text().await.ok(),
        });
    }

    response.text().await.map_err(classify_error)
}

/// Fetches a URL, pacing it through the throttle and retrying transient failures
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 429 | Raise throttle delay, retry with backoff |
/// | HTTP 5xx | Retry with backoff |
/// | Timeout | Retry with backoff |
/// | Other 4xx | Immediate terminal failure |
/// | Connection refused | Immediate terminal failure |
///
/// At most `policy.max_retries` retries follow the first attempt.
pub async fn fetch_with_retry(
    client: &Client,
    url: &Url,
    throttle: &Mutex<Throttle>,
    policy: &RetryPolicy,
) -> FetchReport {
    let mut attempt = 0;

    loop {
        attempt += 1;

        let wait = throttle.lock().await.reserve(Instant::now());
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        let result = fetch_once(client, url).await;
        match &result {
            Ok(_) => throttle.lock().await.record_success(),
            Err(FetchFailure::Throttled) => throttle.lock().await.record_throttled(),
            Err(_) => {}
        }

        match result {
            Err(failure) if failure.is_transient() && policy.should_retry(attempt) => {
                let delay = policy.delay(attempt);
                tracing::debug!(
                    "Retrying {} after {} (attempt {}, waiting {:?})",
                    url,
                    failure,
                    attempt,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            result => {
                if let Err(failure) = &result {
                    tracing::debug!("Giving up on {} after {} attempts: {}", url, attempt, failure);
                }
                return FetchReport {
                    result,
                    attempts: attempt,
                };
            }
        }
    }
}

fn classify_error(error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Network {
            error: error.to_string(),
        }
    }
}
