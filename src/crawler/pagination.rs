use std::fmt;

/// Why a run or its listing stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The provider reported no further pages
    Exhausted,
    /// A page came back with no items
    EmptyPage,
    /// A page held nothing that was not already collected
    CaughtUp,
    /// The configured page ceiling was reached
    PageCeiling,
    /// The listing request failed
    ProviderError,
    /// The operator interrupted the run
    Cancelled,
    /// The daily request quota ran out
    QuotaExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Exhausted => "listing exhausted",
            Self::EmptyPage => "empty page",
            Self::CaughtUp => "caught up with dataset",
            Self::PageCeiling => "page ceiling reached",
            Self::ProviderError => "provider error",
            Self::Cancelled => "cancelled",
            Self::QuotaExhausted => "quota exhausted",
        };
        f.write_str(text)
    }
}

/// Pagination state; there are no backward transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationState {
    /// Waiting on (or about to request) `page`
    Fetching { page: u32 },
    Done(StopReason),
}

/// What one listing page contributed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageReport {
    /// Items on the page
    pub items: usize,
    /// Items that were not already collected or dispatched
    pub new_candidates: usize,
    /// The provider reported more pages
    pub has_more: bool,
}

/// Drives the listing forward one page at a time
#[derive(Debug, Clone)]
pub struct PaginationDriver {
    state: PaginationState,
    max_pages: Option<u32>,
}

impl PaginationDriver {
    /// Starts at page 1
    pub fn new(max_pages: Option<u32>) -> Self {
        Self {
            state: PaginationState::Fetching { page: 1 },
            max_pages,
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, PaginationState::Done(_))
    }

    /// Applies the outcome of the current page and returns the new state
    ///
    /// The next page is requested only when the provider has more and the
    /// current page yielded at least one new candidate.
    pub fn advance(&mut self, report: PageReport) -> PaginationState {
        let PaginationState::Fetching { page } = self.state else {
            return self.state;
        };

        self.state = if report.items == 0 {
            PaginationState::Done(StopReason::EmptyPage)
        } else if !report.has_more {
            PaginationState::Done(StopReason::Exhausted)
        } else if report.new_candidates == 0 {
            PaginationState::Done(StopReason::CaughtUp)
        } else if self.max_pages.is_some_and(|max| page >= max) {
            PaginationState::Done(StopReason::PageCeiling)
        } else {
            PaginationState::Fetching { page: page + 1 }
        };

        self.state
    }

    /// Stops pagination; a driver that is already done keeps its reason
    pub fn stop(&mut self, reason: StopReason) {
        if !self.is_done() {
            self.state = PaginationState::Done(reason);
        }
    }
}
