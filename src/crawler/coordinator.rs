//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the event loop that drives a run:
//! - Loading the identifiers collected by earlier runs
//! - Paginating a listing or reading known sources
//! - Batching new identifiers and keeping the request window full
//! - Correlating responses and issuing answer follow-ups
//! - Draining in-flight work on interrupt and persisting missing identifiers

use crate::config::{Config, CrawlMode};
use crate::crawler::context::{PartialRecord, RequestContext};
use crate::crawler::correlator::correlate;
use crate::crawler::fetcher::{build_http_client, FetchFailure};
use crate::crawler::pagination::{PageReport, PaginationDriver, PaginationState, StopReason};
use crate::crawler::parser::{BodyCleaner, HtmlCleaner};
use crate::crawler::scheduler::{Completion, Scheduler};
use crate::ids::{
    filter_new, into_batches, unique_by_identifier, Batch, CrawledIds, Extracted, SourceRecord,
};
use crate::output::{JsonLinesSink, OutputRecord, OwnerRecord, RecordSink, RunSummary};
use crate::provider::{
    self, interpret, interpret_with, parse_array, parse_categories, parse_single,
    parse_topic_list, ApiAnswer, ApiQuestion, Discourse, ForumCategory, ForumTopic, Identified,
    IndexPackage, ProviderErrorKind, ProviderResponse, RosIndex, RosWiki, StackExchange,
};
use crate::state::MissingIds;
use crate::storage::read_dataset_urls;
use crate::{ConfigError, HarvestError};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative stop signal shared with the interrupt handler
///
/// Once requested, no new listing pages or batches are dispatched. Requests
/// already in flight, and the answer follow-ups they trigger, still complete.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sources read from the input file after extraction and deduplication
#[derive(Debug, Clone)]
pub struct SourcePlan {
    pub batches: Vec<Batch>,
    /// Identifiers across all batches
    pub identifiers: usize,
    /// Entries with no URL or no recognizable identifier
    pub malformed: usize,
    /// Repeated or already collected identifiers
    pub duplicates: usize,
}

/// Loads the identifiers of every record in the configured dataset
///
/// No dataset configured means nothing has been collected yet. A configured
/// dataset that cannot be read is an error.
pub fn load_crawled_ids(config: &Config) -> Result<CrawledIds, HarvestError> {
    let Some(path) = &config.input.dataset_path else {
        return Ok(CrawledIds::new());
    };

    let dataset = read_dataset_urls(Path::new(path), &config.input.url_field)?;
    Ok(CrawledIds::from_urls(
        &dataset.urls,
        &provider::extractor(config),
    ))
}

/// Reads the configured sources and turns them into batches
///
/// In wiki mode the entries are package index URLs or bare package names;
/// otherwise they are URLs carrying a numeric identifier.
pub fn plan_sources(config: &Config, crawled: &CrawledIds) -> Result<SourcePlan, HarvestError> {
    let path = config.input.source_path.as_deref().ok_or_else(|| {
        ConfigError::Validation(format!(
            "{:?} mode requires input.source-path",
            config.crawler.mode
        ))
    })?;

    let sources = read_dataset_urls(Path::new(path), &config.input.url_field)?;
    let extracted = match config.crawler.mode {
        CrawlMode::Wiki => wiki_seeds(config, &sources.urls),
        _ => provider::extractor(config).extract_all(&sources.urls),
    };

    let total = extracted.records.len();
    let fresh = filter_new(crawled, &unique_by_identifier(extracted.records));

    Ok(SourcePlan {
        identifiers: fresh.len(),
        malformed: sources.skipped + extracted.rejected.len(),
        duplicates: total - fresh.len(),
        batches: into_batches(fresh, provider::batch_limit(config)),
    })
}

fn wiki_seeds(config: &Config, entries: &[String]) -> Extracted {
    let index = RosIndex::from_config(&config.index);
    let wiki = RosWiki::from_config(&config.wiki);

    let mut extracted = Extracted::default();
    for entry in entries {
        match index.package_name(entry) {
            Some(package) => extracted.records.push(wiki.seed(&package)),
            None => extracted.rejected.push(entry.clone()),
        }
    }
    extracted
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    provider: StackExchange,
    index: RosIndex,
    wiki: RosWiki,
    forum: Discourse,
    scheduler: Scheduler,
    cleaner: Box<dyn BodyCleaner>,
    sink: Box<dyn RecordSink>,

    /// Identifiers collected by earlier runs; read-only for the run
    crawled: CrawledIds,

    /// Identifiers queued or dispatched in this run
    claimed: HashSet<String>,

    /// Batches waiting for a free request slot
    pending: VecDeque<Batch>,

    /// Forum category the topic listing is scoped to, once resolved
    category: Option<ForumCategory>,

    missing: MissingIds,
    pagination: Option<PaginationDriver>,
    shutdown: ShutdownHandle,
    stopping: bool,
    stop_reason: Option<StopReason>,
    summary: RunSummary,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `sink` - Where emitted records go
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The dataset could not be read or the client not built
    pub fn new(config: Config, sink: Box<dyn RecordSink>) -> Result<Self, HarvestError> {
        let crawled = load_crawled_ids(&config)?;
        tracing::info!("Loaded {} collected identifiers", crawled.len());

        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;

        Ok(Self {
            provider: StackExchange::from_config(&config.provider),
            index: RosIndex::from_config(&config.index),
            wiki: RosWiki::from_config(&config.wiki),
            forum: Discourse::from_config(&config.forum),
            scheduler: Scheduler::new(client, &config.crawler),
            cleaner: Box::new(HtmlCleaner),
            sink,
            crawled,
            claimed: HashSet::new(),
            pending: VecDeque::new(),
            category: None,
            missing: MissingIds::new(),
            pagination: None,
            shutdown: ShutdownHandle::new(),
            stopping: false,
            stop_reason: None,
            summary: RunSummary::new(config.crawler.mode),
            config,
        })
    }

    /// Replaces the HTML cleaner
    pub fn with_cleaner(mut self, cleaner: Box<dyn BodyCleaner>) -> Self {
        self.cleaner = cleaner;
        self
    }

    /// Uses an externally owned stop signal
    pub fn with_shutdown(mut self, shutdown: ShutdownHandle) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Runs the crawl until the listing is done and all requests have drained
    ///
    /// The missing-identifier file is written once at the end, including
    /// after an interrupt.
    pub async fn run(&mut self) -> Result<RunSummary, HarvestError> {
        let started = Instant::now();
        tracing::info!(
            "Starting {:?} run against {}",
            self.config.crawler.mode,
            self.target()
        );

        match self.config.crawler.mode {
            CrawlMode::Harvest => self.start_listing(),
            CrawlMode::Revisit => self.queue_sources()?,
            CrawlMode::Wiki if self.config.input.source_path.is_some() => self.queue_sources()?,
            CrawlMode::Index | CrawlMode::Wiki => {
                // The package list comes in one response
                self.pagination = Some(PaginationDriver::new(None));
                self.request_listing(1);
            }
            CrawlMode::Forum => self.request_categories(),
        }

        loop {
            if !self.stopping && self.shutdown.is_requested() {
                tracing::warn!(
                    "Interrupt received, draining {} in-flight requests",
                    self.scheduler.in_flight()
                );
                self.stop(StopReason::Cancelled);
            }

            if !self.stopping {
                self.fill_window();
            }

            let completion = match self.scheduler.next_completion().await {
                Some(completion) => completion,
                None if self.stopping || self.pending.is_empty() => break,
                None => continue,
            };

            self.handle_completion(completion).await?;
        }

        self.finish(started).await
    }

    fn target(&self) -> &str {
        match self.config.crawler.mode {
            CrawlMode::Harvest | CrawlMode::Revisit => &self.config.provider.site,
            CrawlMode::Index => &self.config.index.base,
            CrawlMode::Wiki => &self.config.wiki.base,
            CrawlMode::Forum => &self.config.forum.base,
        }
    }

    async fn finish(&mut self, started: Instant) -> Result<RunSummary, HarvestError> {
        self.summary.ids_undispatched = self.pending.iter().map(|b| b.len() as u64).sum();
        if self.summary.ids_undispatched > 0 {
            tracing::info!(
                "{} identifiers were not dispatched; a later run will pick them up",
                self.summary.ids_undispatched
            );
        }

        self.sink.flush()?;
        self.missing
            .persist(Path::new(&self.config.output.missing_path))?;

        self.summary.missing = self.missing.len() as u64;
        self.summary.requests = self.scheduler.dispatched();
        self.summary.throttle_hits = self.scheduler.throttle_hits().await;
        self.summary.stop_reason = self.stop_reason.or_else(|| {
            self.pagination.as_ref().and_then(|driver| match driver.state() {
                PaginationState::Done(reason) => Some(reason),
                PaginationState::Fetching { .. } => None,
            })
        });
        self.summary.elapsed = started.elapsed();

        tracing::info!(
            "Run finished: {} records emitted, {} identifiers missing in {:?}",
            self.summary.records_emitted,
            self.summary.missing,
            self.summary.elapsed
        );

        Ok(self.summary.clone())
    }

    fn stop(&mut self, reason: StopReason) {
        if !self.stopping {
            self.stopping = true;
            self.stop_reason = Some(reason);
        }
        if let Some(driver) = self.pagination.as_mut() {
            driver.stop(reason);
        }
    }

    fn fill_window(&mut self) {
        while self.scheduler.has_capacity() {
            let Some(batch) = self.pending.pop_front() else {
                break;
            };
            self.dispatch_batch(batch);
        }
    }

    fn dispatch_batch(&mut self, batch: Batch) {
        self.summary.ids_dispatched += batch.len() as u64;
        let mode = self.config.crawler.mode;
        let url = match mode {
            CrawlMode::Wiki => self.wiki.page_url(&batch),
            CrawlMode::Forum => self.forum.topic_url(&batch),
            CrawlMode::Harvest | CrawlMode::Revisit | CrawlMode::Index => {
                self.provider.details_url(&batch)
            }
        };

        match url {
            Ok(url) => {
                self.summary.batches_dispatched += 1;
                let context = match mode {
                    CrawlMode::Wiki => RequestContext::WikiPage(batch),
                    CrawlMode::Forum => RequestContext::Topic(batch),
                    CrawlMode::Harvest | CrawlMode::Revisit | CrawlMode::Index => {
                        RequestContext::Batch(batch)
                    }
                };
                self.scheduler.dispatch(url, context);
            }
            Err(e) => {
                tracing::warn!("Could not build request for {}: {}", batch.joined_ids(), e);
                self.missing.extend(batch.into_members());
            }
        }
    }

    /// Starts a paginated listing bounded by the configured page ceiling
    fn start_listing(&mut self) {
        self.pagination = Some(PaginationDriver::new(self.config.crawler.max_pages));
        self.request_listing(1);
    }

    fn request_listing(&mut self, page: u32) {
        if self.shutdown.is_requested() {
            self.stop(StopReason::Cancelled);
            return;
        }

        let request = match self.config.crawler.mode {
            CrawlMode::Forum => self
                .forum
                .topics_url(self.category.as_ref(), page)
                .map(|url| (url, RequestContext::Topics { page })),
            CrawlMode::Index | CrawlMode::Wiki => self
                .index
                .packages_url()
                .map(|url| (url, RequestContext::Packages)),
            CrawlMode::Harvest | CrawlMode::Revisit => self
                .provider
                .listing_url(page)
                .map(|url| (url, RequestContext::Listing { page })),
        };

        match request {
            Ok((url, context)) => self.scheduler.dispatch(url, context),
            Err(e) => {
                tracing::error!("Could not build listing request: {}", e);
                if let Some(driver) = self.pagination.as_mut() {
                    driver.stop(StopReason::ProviderError);
                }
            }
        }
    }

    /// Looks up the configured forum category before listing its topics
    fn request_categories(&mut self) {
        if self.forum.category().is_empty() {
            self.start_listing();
            return;
        }

        match self.forum.categories_url() {
            Ok(url) => self.scheduler.dispatch(url, RequestContext::Categories),
            Err(e) => {
                tracing::error!("Could not build category request: {}", e);
                self.start_listing();
            }
        }
    }

    fn request_answers(&mut self, partial: PartialRecord, page: u32) {
        match self.provider.answers_url(&partial.source().identifier, page) {
            Ok(url) => self
                .scheduler
                .dispatch(url, RequestContext::Answers { partial, page }),
            Err(e) => {
                tracing::warn!("Could not build answers request: {}", e);
                self.missing.record(partial.into_source());
            }
        }
    }

    /// Claims a candidate unless it is collected or already claimed
    fn claim(&mut self, record: &SourceRecord) -> bool {
        let fresh = !self.crawled.contains(&record.identifier)
            && self.claimed.insert(record.identifier.clone());
        if !fresh {
            self.summary.duplicates_skipped += 1;
        }
        fresh
    }

    /// Keeps the candidates that are neither collected nor already claimed
    fn claim_new(&mut self, candidates: &[SourceRecord]) -> Vec<SourceRecord> {
        candidates
            .iter()
            .filter(|record| self.claim(record))
            .cloned()
            .collect()
    }

    fn queue_sources(&mut self) -> Result<(), HarvestError> {
        let plan = plan_sources(&self.config, &self.crawled)?;
        self.summary.malformed_skipped += plan.malformed as u64;
        self.summary.duplicates_skipped += plan.duplicates as u64;

        for batch in &plan.batches {
            for member in batch.members() {
                self.claimed.insert(member.identifier.clone());
            }
        }

        tracing::info!(
            "Queued {} identifiers in {} batches ({} already collected, {} malformed)",
            plan.identifiers,
            plan.batches.len(),
            plan.duplicates,
            plan.malformed
        );
        self.pending.extend(plan.batches);
        Ok(())
    }

    async fn handle_completion(&mut self, completion: Completion) -> Result<(), HarvestError> {
        if let Err(failure) = &completion.result {
            tracing::warn!(
                "{} failed after {} attempts: {}",
                completion.context.describe(),
                completion.attempts,
                failure
            );
        }

        match completion.context {
            RequestContext::Listing { page } => {
                self.handle_listing(page, completion.result).await;
                Ok(())
            }
            RequestContext::Batch(batch) => self.handle_batch(batch, completion.result).await,
            RequestContext::Answers { partial, page } => {
                self.handle_answers(partial, page, completion.result).await
            }
            RequestContext::Packages => self.handle_packages(completion.result).await,
            RequestContext::Categories => {
                self.handle_categories(completion.result).await;
                Ok(())
            }
            RequestContext::Topics { page } => {
                self.handle_topics(page, completion.result).await;
                Ok(())
            }
            RequestContext::WikiPage(batch) => {
                self.handle_wiki_page(batch, completion.result).await
            }
            RequestContext::Topic(batch) => self.handle_topic(batch, completion.result).await,
        }
    }

    /// Applies provider hints carried by any response
    async fn observe<T>(&mut self, response: &ProviderResponse<T>) {
        if let Some(meta) = response.meta() {
            if let Some(seconds) = meta.backoff {
                tracing::warn!("Provider requested a {}s backoff", seconds);
                self.scheduler.hold_off(Duration::from_secs(seconds)).await;
            }
            if meta.quota_remaining == Some(0) {
                tracing::warn!("Request quota exhausted, stopping after in-flight requests");
                self.stop(StopReason::QuotaExhausted);
            }
        }

        match response {
            ProviderResponse::ProviderError(ProviderErrorKind::QuotaExhausted) => {
                tracing::warn!("Request quota exhausted, stopping after in-flight requests");
                self.stop(StopReason::QuotaExhausted);
            }
            ProviderResponse::ProviderError(ProviderErrorKind::Throttled { .. }) => {
                self.scheduler.record_throttled().await;
            }
            _ => {}
        }
    }

    async fn handle_listing(&mut self, page: u32, result: Result<String, FetchFailure>) {
        let response: ProviderResponse<ApiQuestion> = interpret(result);
        self.summary.pages_fetched += 1;
        self.observe(&response).await;

        let candidates = response.map(|question| self.provider.source_record(&question));
        self.queue_listing(page, candidates);
    }

    async fn handle_topics(&mut self, page: u32, result: Result<String, FetchFailure>) {
        let response = interpret_with(result, parse_topic_list);
        self.summary.pages_fetched += 1;
        self.observe(&response).await;

        let candidates = response.map(|topic| self.forum.source_record(&topic));
        self.queue_listing(page, candidates);
    }

    /// Queues the new candidates of a listing page and requests the next page
    fn queue_listing(&mut self, page: u32, candidates: ProviderResponse<SourceRecord>) {
        let report = match candidates {
            ProviderResponse::Success(listing) => {
                let fresh = self.claim_new(&listing.items);
                tracing::info!(
                    "Listing page {}: {} candidates, {} new",
                    page,
                    listing.items.len(),
                    fresh.len()
                );

                let report = PageReport {
                    items: listing.items.len(),
                    new_candidates: fresh.len(),
                    has_more: listing.meta.has_more,
                };
                self.pending
                    .extend(into_batches(fresh, provider::batch_limit(&self.config)));
                report
            }
            ProviderResponse::EmptyPage(meta) => {
                tracing::info!("Listing page {} is empty", page);
                PageReport {
                    items: 0,
                    new_candidates: 0,
                    has_more: meta.has_more,
                }
            }
            ProviderResponse::ProviderError(kind) => {
                tracing::warn!("Listing page {} failed: {}", page, kind);
                if let Some(driver) = self.pagination.as_mut() {
                    driver.stop(StopReason::ProviderError);
                }
                return;
            }
        };

        self.advance_listing(page, report);
    }

    fn advance_listing(&mut self, page: u32, report: PageReport) {
        let Some(driver) = self.pagination.as_mut() else {
            return;
        };
        match driver.advance(report) {
            PaginationState::Fetching { page: next } => self.request_listing(next),
            PaginationState::Done(reason) => {
                tracing::info!("Listing finished after page {}: {}", page, reason)
            }
        }
    }

    /// Emits index packages directly, or queues their wiki pages
    async fn handle_packages(
        &mut self,
        result: Result<String, FetchFailure>,
    ) -> Result<(), HarvestError> {
        let response: ProviderResponse<IndexPackage> = interpret_with(result, parse_array);
        self.summary.pages_fetched += 1;
        self.observe(&response).await;

        let report = match response {
            ProviderResponse::Success(listing) => {
                let mut seeds = Vec::new();
                let mut fresh = 0;
                for package in &listing.items {
                    let Some(source) = self.index.source_record(package) else {
                        self.summary.malformed_skipped += 1;
                        continue;
                    };
                    if !self.claim(&source) {
                        continue;
                    }
                    fresh += 1;

                    if self.config.crawler.mode == CrawlMode::Wiki {
                        seeds.push(self.wiki.seed(&source.identifier));
                    } else {
                        self.summary.ids_dispatched += 1;
                        let record = self.index.record(&source, package);
                        self.emit(OutputRecord::Package(record))?;
                    }
                }

                tracing::info!(
                    "Package list: {} packages, {} new",
                    listing.items.len(),
                    fresh
                );
                self.pending.extend(into_batches(seeds, 1));
                PageReport {
                    items: listing.items.len(),
                    new_candidates: fresh,
                    has_more: false,
                }
            }
            ProviderResponse::EmptyPage(_) => {
                tracing::info!("Package list is empty");
                PageReport {
                    items: 0,
                    new_candidates: 0,
                    has_more: false,
                }
            }
            ProviderResponse::ProviderError(kind) => {
                tracing::warn!("Package list failed: {}", kind);
                if let Some(driver) = self.pagination.as_mut() {
                    driver.stop(StopReason::ProviderError);
                }
                return Ok(());
            }
        };

        self.advance_listing(1, report);
        Ok(())
    }

    /// Resolves the configured category, falling back to the latest topics
    async fn handle_categories(&mut self, result: Result<String, FetchFailure>) {
        let response = interpret_with(result, parse_categories);
        self.observe(&response).await;

        match response {
            ProviderResponse::Success(page) => match self.forum.resolve(&page.items) {
                Some(category) => {
                    tracing::info!("Category {} has id {}", category.slug, category.id);
                    self.category = Some(category.clone());
                }
                None => tracing::warn!(
                    "Category {} not found, listing the latest topics instead",
                    self.forum.category()
                ),
            },
            ProviderResponse::EmptyPage(_) => tracing::warn!(
                "Forum lists no categories, listing the latest topics instead"
            ),
            ProviderResponse::ProviderError(kind) => tracing::warn!(
                "Category lookup failed, listing the latest topics instead: {}",
                kind
            ),
        }

        if !self.stopping {
            self.start_listing();
        }
    }

    /// Observes and correlates a detail response, recording omitted members missing
    async fn settle<T: Identified>(
        &mut self,
        batch: Batch,
        response: ProviderResponse<T>,
    ) -> Vec<(SourceRecord, T)> {
        let requested = batch.len();
        self.observe(&response).await;

        let correlation = correlate(batch, response);
        if let Some(error) = &correlation.error {
            tracing::warn!("Batch of {} failed: {}", requested, error);
        } else if !correlation.missing.is_empty() {
            tracing::warn!(
                "{} of {} identifiers missing from batch",
                correlation.missing.len(),
                requested
            );
        }
        self.missing.extend(correlation.missing);
        correlation.found
    }

    async fn handle_batch(
        &mut self,
        batch: Batch,
        result: Result<String, FetchFailure>,
    ) -> Result<(), HarvestError> {
        let response: ProviderResponse<ApiQuestion> = interpret(result);
        for (source, question) in self.settle(batch, response).await {
            self.complete_question(source, question)?;
        }
        Ok(())
    }

    async fn handle_wiki_page(
        &mut self,
        batch: Batch,
        result: Result<String, FetchFailure>,
    ) -> Result<(), HarvestError> {
        let package = batch
            .members()
            .first()
            .map(|member| member.identifier.clone())
            .unwrap_or_default();
        let response = interpret_with(result, |html| {
            self.wiki.parse_page(&package, html, self.cleaner.as_ref())
        });

        for (source, page) in self.settle(batch, response).await {
            let record = self.wiki.record(source, page);
            self.emit(OutputRecord::Wiki(record))?;
        }
        Ok(())
    }

    async fn handle_topic(
        &mut self,
        batch: Batch,
        result: Result<String, FetchFailure>,
    ) -> Result<(), HarvestError> {
        let response: ProviderResponse<ForumTopic> = interpret_with(result, parse_single);
        for (source, topic) in self.settle(batch, response).await {
            let record = self.forum.record(source, &topic, self.cleaner.as_ref());
            self.emit(OutputRecord::Topic(record))?;
        }
        Ok(())
    }

    fn complete_question(
        &mut self,
        source: SourceRecord,
        question: ApiQuestion,
    ) -> Result<(), HarvestError> {
        match self.config.crawler.mode {
            CrawlMode::Harvest => {
                let partial = PartialRecord::from_question(source, &question, self.cleaner.as_ref());
                if self.config.provider.fetch_answers && question.answer_count > 0 {
                    self.request_answers(partial, 1);
                    Ok(())
                } else {
                    self.emit(partial.finalize())
                }
            }
            _ => self.emit(OutputRecord::Owner(OwnerRecord {
                url: source.source_url,
                user: question.owner.and_then(|owner| owner.display_name),
            })),
        }
    }

    async fn handle_answers(
        &mut self,
        mut partial: PartialRecord,
        page: u32,
        result: Result<String, FetchFailure>,
    ) -> Result<(), HarvestError> {
        let response: ProviderResponse<ApiAnswer> = interpret(result);
        self.observe(&response).await;

        match response {
            ProviderResponse::Success(answers) => {
                for answer in &answers.items {
                    partial.attach_answer(&answer.body, self.cleaner.as_ref());
                }
                if answers.meta.has_more {
                    self.request_answers(partial, page + 1);
                    Ok(())
                } else {
                    self.emit(partial.finalize())
                }
            }
            ProviderResponse::EmptyPage(_) => self.emit(partial.finalize()),
            ProviderResponse::ProviderError(kind) => {
                tracing::warn!(
                    "Answers for {} failed, recording it missing: {}",
                    partial.source().identifier,
                    kind
                );
                self.missing.record(partial.into_source());
                Ok(())
            }
        }
    }

    fn emit(&mut self, record: OutputRecord) -> Result<(), HarvestError> {
        self.sink.emit(&record)?;
        self.summary.records_emitted += 1;
        Ok(())
    }
}

/// Runs a complete crawl, appending records to the configured records file
///
/// # Example
///
/// ```no_run
/// use qa_harvest::config::load_config;
/// use qa_harvest::crawler::{run_crawl, ShutdownHandle};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let summary = run_crawl(config, ShutdownHandle::new()).await?;
/// println!("{} records", summary.records_emitted);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    shutdown: ShutdownHandle,
) -> Result<RunSummary, HarvestError> {
    let sink = JsonLinesSink::open(Path::new(&config.output.records_path))?;
    let mut coordinator = Coordinator::new(config, Box::new(sink))?.with_shutdown(shutdown);
    coordinator.run().await
}
