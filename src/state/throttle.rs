use crate::config::CrawlerConfig;
use std::time::{Duration, Instant};

/// Adaptive inter-request delay shared by every request of a run
///
/// The delay starts at the configured floor, grows by one step for every
/// throttling response and shrinks by half a step for every success, never
/// leaving `[floor, ceiling]`. Requests reserve send slots spaced by the
/// current delay, so concurrent tasks cannot burst past it.
#[derive(Debug, Clone)]
pub struct Throttle {
    /// Current spacing between request starts
    current_delay: Duration,

    /// Hard floor of the delay
    floor: Duration,

    /// Upper bound the delay may grow to
    ceiling: Duration,

    /// Amount added per throttling response
    step: Duration,

    /// Earliest instant the next request may start
    next_slot: Option<Instant>,

    /// Requests that reserved a slot
    pub total_requests: u64,

    /// Throttling responses seen
    pub throttle_hits: u64,
}

impl Throttle {
    pub fn new(floor: Duration, ceiling: Duration, step: Duration) -> Self {
        Self {
            current_delay: floor,
            floor,
            ceiling: ceiling.max(floor),
            step,
            next_slot: None,
            total_requests: 0,
            throttle_hits: 0,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.minimum_delay(),
            config.maximum_delay(),
            config.throttle_step(),
        )
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    /// Reserves the next send slot
    ///
    /// # Arguments
    ///
    /// * `now` - The current time instant
    ///
    /// # Returns
    ///
    /// How long the caller must wait before sending. Zero if it may send now.
    pub fn reserve(&mut self, now: Instant) -> Duration {
        let slot = match self.next_slot {
            Some(next) if next > now => next,
            _ => now,
        };
        self.next_slot = Some(slot + self.current_delay);
        self.total_requests += 1;
        slot.duration_since(now)
    }

    /// Records a throttling response (HTTP 429)
    pub fn record_throttled(&mut self) {
        self.throttle_hits += 1;
        self.current_delay = (self.current_delay + self.step).min(self.ceiling);
        tracing::trace!("Throttle delay raised to {:?}", self.current_delay);
    }

    /// Records a successful response
    pub fn record_success(&mut self) {
        let relaxed = self.current_delay.saturating_sub(self.step / 2).max(self.floor);
        if relaxed != self.current_delay {
            tracing::trace!("Throttle delay lowered to {:?}", relaxed);
        }
        self.current_delay = relaxed;
    }

    /// Keeps every request from starting for `pause` after `now`
    ///
    /// Used when the provider sends an explicit backoff hint.
    pub fn hold_off(&mut self, now: Instant, pause: Duration) {
        let until = now + pause;
        self.next_slot = Some(match self.next_slot {
            Some(next) if next > until => next,
            _ => until,
        });
    }
}

/// Bounded exponential retry policy for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Largest delay between two attempts
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_delay(),
            max_delay: config.maximum_delay().max(config.retry_delay()),
        }
    }

    /// Whether another attempt is allowed after `attempt` attempts failed
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }

    /// Delay before the retry that follows the `attempt`-th failure (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}
