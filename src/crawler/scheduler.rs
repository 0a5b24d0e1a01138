//! Scheduler for outbound provider requests
//!
//! This module handles:
//! - Spawning one task per request, each carrying its `RequestContext`
//! - Global concurrency limiting via a semaphore
//! - Shared adaptive throttling and bounded retries
//! - Handing every context back exactly once, even if its task dies

use crate::config::CrawlerConfig;
use crate::crawler::context::RequestContext;
use crate::crawler::fetcher::{fetch_with_retry, FetchFailure, FetchReport};
use crate::state::{RetryPolicy, Throttle};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use url::Url;

/// A finished request together with what it was sent for
#[derive(Debug)]
pub struct Completion {
    pub context: RequestContext,
    pub url: Url,
    pub result: Result<String, FetchFailure>,
    pub attempts: u32,
}

/// Scheduler owns the in-flight requests of a run
///
/// The scheduler coordinates:
/// - Global concurrency limits (max concurrent requests)
/// - The shared throttle every request is paced through
/// - The request contexts of everything in flight
pub struct Scheduler {
    client: Client,

    /// Global semaphore for limiting concurrent requests
    semaphore: Arc<Semaphore>,

    /// Configured concurrency ceiling
    capacity: usize,

    throttle: Arc<Mutex<Throttle>>,

    retry: RetryPolicy,

    tasks: JoinSet<(u64, FetchReport)>,

    /// Context of every request whose completion has not been handed out
    in_flight: HashMap<u64, (Url, RequestContext)>,

    next_id: u64,

    /// Total requests dispatched
    dispatched: u64,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client shared by all requests
    /// * `config` - Crawler configuration with concurrency, delay and retry limits
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        let capacity = config.max_concurrent_requests.max(1) as usize;
        Self {
            client,
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            throttle: Arc::new(Mutex::new(Throttle::from_config(config))),
            retry: RetryPolicy::from_config(config),
            tasks: JoinSet::new(),
            in_flight: HashMap::new(),
            next_id: 0,
            dispatched: 0,
        }
    }

    /// Starts a request; its context comes back from `next_completion`
    pub fn dispatch(&mut self, url: Url, context: RequestContext) {
        let id = self.next_id;
        self.next_id += 1;
        self.dispatched += 1;

        tracing::debug!("Dispatching {} ({})", context.describe(), url);
        self.in_flight.insert(id, (url.clone(), context));

        let client = self.client.clone();
        let semaphore = Arc::clone(&self.semaphore);
        let throttle = Arc::clone(&self.throttle);
        let retry = self.retry;

        self.tasks.spawn(async move {
            let report = match semaphore.acquire_owned().await {
                Ok(_permit) => fetch_with_retry(&client, &url, &throttle, &retry).await,
                Err(_) => FetchReport {
                    result: Err(FetchFailure::Aborted),
                    attempts: 0,
                },
            };
            (id, report)
        });
    }

    /// Waits for the next finished request
    ///
    /// Returns `None` once nothing is in flight. A task that panicked or was
    /// cancelled is reported as `FetchFailure::Aborted` with its original
    /// context.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        loop {
            match self.tasks.join_next().await {
                Some(Ok((id, report))) => match self.in_flight.remove(&id) {
                    Some((url, context)) => {
                        return Some(Completion {
                            context,
                            url,
                            result: report.result,
                            attempts: report.attempts,
                        })
                    }
                    None => continue,
                },
                Some(Err(e)) => {
                    tracing::error!("Request task failed: {}", e);
                    continue;
                }
                None => {
                    let id = *self.in_flight.keys().next()?;
                    let (url, context) = self.in_flight.remove(&id)?;
                    return Some(Completion {
                        context,
                        url,
                        result: Err(FetchFailure::Aborted),
                        attempts: 0,
                    });
                }
            }
        }
    }

    /// Requests dispatched and not yet handed back
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn has_capacity(&self) -> bool {
        self.in_flight() < self.capacity
    }

    /// Total requests dispatched so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Holds every request off for `pause`
    pub async fn hold_off(&self, pause: Duration) {
        self.throttle.lock().await.hold_off(Instant::now(), pause);
    }

    /// Raises the throttle delay after a provider-reported throttle violation
    pub async fn record_throttled(&self) {
        self.throttle.lock().await.record_throttled();
    }

    /// Throttle hits seen so far
    pub async fn throttle_hits(&self) -> u64 {
        self.throttle.lock().await.throttle_hits
    }
}
