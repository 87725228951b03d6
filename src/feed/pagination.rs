//! Pagination controller: the state machine behind fetch-more.
//!
//! The controller never performs I/O itself. [`PaginationController::request_more`]
//! hands out a [`FetchTicket`] when a fetch may start, and the caller reports
//! the outcome through [`PaginationController::complete`] with the ticket's
//! epoch. Every category switch bumps the epoch, so a completion carrying an
//! older epoch is dropped without touching the page.
//!
//! # States
//!
//! ```text
//!            request_more            batch ok, more left
//!   Idle ─────────────────▶ Loading ─────────────────────▶ Idle
//!     ▲                        │
//!     │        fetch error     │  no more / empty / ceiling
//!     └────────────────────────┤
//!                              ▼
//!                          Exhausted ──(switch_category)──▶ Idle
//! ```

use super::item::{CategoryFilter, FeedItem, ItemId};
use super::source::{Continuation, FetchError, FetchedBatch};
use std::collections::HashSet;

/// Default cumulative item ceiling per category.
pub const DEFAULT_MAX_ITEMS: usize = 20;

// ============================================================================
// Page
// ============================================================================

/// Append-only item store for one category epoch.
///
/// Ids are unique within the page: a repeated id is dropped and the first
/// occurrence kept.
#[derive(Debug, Default)]
pub struct FeedPage {
    items: Vec<FeedItem>,
    ids: HashSet<ItemId>,
    next_seq: u64,
    /// Items appended by fetch-more completions (seed excluded).
    fetched_count: usize,
    /// Successful fetch-more completions.
    page_count: usize,
}

impl FeedPage {
    fn seeded(seed: Vec<FeedItem>) -> Self {
        let mut page = Self::default();
        let (_, duplicates) = page.push_unique(seed);
        if duplicates > 0 {
            tracing::debug!(duplicates, "Dropped duplicate ids from seed batch");
        }
        page
    }

    /// Append a fetched batch, returning `(added, duplicates)`.
    fn append(&mut self, batch: Vec<FeedItem>) -> (usize, usize) {
        let (added, duplicates) = self.push_unique(batch);
        self.fetched_count += added;
        self.page_count += 1;
        (added, duplicates)
    }

    fn push_unique(&mut self, batch: Vec<FeedItem>) -> (usize, usize) {
        let mut added = 0;
        let mut duplicates = 0;
        for mut item in batch {
            if !self.ids.insert(item.id.clone()) {
                duplicates += 1;
                continue;
            }
            item.synthesized_at = self.next_seq;
            self.next_seq += 1;
            self.items.push(item);
            added += 1;
        }
        (added, duplicates)
    }

    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    pub fn fetched_count(&self) -> usize {
        self.fetched_count
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    fn last_id(&self) -> Option<ItemId> {
        self.items.last().map(|item| item.id.clone())
    }
}

// ============================================================================
// Controller Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Idle,
    Loading,
    Exhausted,
}

/// Snapshot of the loading indicators for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingState {
    pub is_loading: bool,
    pub has_more: bool,
    /// Last fetch failure, kept until the next request or category switch.
    pub error: Option<FetchError>,
}

/// Permission to run exactly one fetch-more call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub epoch: u64,
    pub continuation: Continuation,
}

/// What a completion did to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The batch was appended.
    Applied {
        added: usize,
        duplicates: usize,
        has_more: bool,
    },
    /// The fetch failed; the page is idle again and unchanged.
    Failed(FetchError),
    /// The completion belongs to an older epoch (or a closed session) and was ignored.
    Stale,
}

// ============================================================================
// Controller
// ============================================================================

#[derive(Debug)]
pub struct PaginationController {
    filter: CategoryFilter,
    page: FeedPage,
    state: PageState,
    epoch: u64,
    max_items: usize,
    error: Option<FetchError>,
    closed: bool,
}

impl PaginationController {
    /// Create a controller for `filter`, pre-loaded with `seed`.
    ///
    /// `max_items` is clamped to at least 1.
    pub fn new(filter: CategoryFilter, seed: Vec<FeedItem>, max_items: usize) -> Self {
        let mut controller = Self {
            filter: CategoryFilter::All,
            page: FeedPage::default(),
            state: PageState::Idle,
            epoch: 0,
            max_items: max_items.max(1),
            error: None,
            closed: false,
        };
        controller.initialize(filter, seed);
        controller
    }

    /// Reset to a fresh idle page for `filter`, seeded synchronously.
    ///
    /// The seed does not count as a fetch. Any fetch still in flight becomes
    /// stale because the epoch moves forward.
    pub fn initialize(&mut self, filter: CategoryFilter, seed: Vec<FeedItem>) {
        self.epoch = self.epoch.wrapping_add(1);
        self.filter = filter;
        self.page = FeedPage::seeded(seed);
        self.state = PageState::Idle;
        self.error = None;
        tracing::debug!(
            epoch = self.epoch,
            category = %self.filter,
            seeded = self.page.len(),
            "Feed page initialized"
        );
    }

    /// Discard the current page and start over for `filter`.
    ///
    /// Safe while a fetch is in flight: its completion is dropped as stale.
    pub fn switch_category(&mut self, filter: CategoryFilter, seed: Vec<FeedItem>) {
        if self.closed {
            return;
        }
        if self.state == PageState::Loading {
            tracing::debug!(
                epoch = self.epoch,
                from = %self.filter,
                to = %filter,
                "Category switched with fetch in flight"
            );
        }
        self.initialize(filter, seed);
    }

    /// Start a fetch if the page is idle.
    ///
    /// Returns `None` (and queues nothing) while loading, once exhausted, or
    /// after [`close`](Self::close).
    pub fn request_more(&mut self) -> Option<FetchTicket> {
        if self.closed {
            return None;
        }
        match self.state {
            PageState::Loading | PageState::Exhausted => {
                tracing::trace!(epoch = self.epoch, state = ?self.state, "Ignoring fetch-more request");
                None
            }
            PageState::Idle => {
                self.state = PageState::Loading;
                self.error = None;
                let ticket = FetchTicket {
                    epoch: self.epoch,
                    continuation: Continuation {
                        count: self.page.len(),
                        category: self.filter.clone(),
                        last_id: self.page.last_id(),
                    },
                };
                tracing::debug!(
                    epoch = self.epoch,
                    category = %self.filter,
                    count = ticket.continuation.count,
                    "Fetch-more started"
                );
                Some(ticket)
            }
        }
    }

    /// Apply the outcome of the fetch started under `epoch`.
    pub fn complete(
        &mut self,
        epoch: u64,
        result: Result<FetchedBatch, FetchError>,
    ) -> Completion {
        // Within one epoch only one fetch is ever in flight, so a matching
        // epoch outside `Loading` is a repeated completion.
        if self.closed || epoch != self.epoch || self.state != PageState::Loading {
            tracing::debug!(
                expected = self.epoch,
                got = epoch,
                closed = self.closed,
                "Ignoring stale fetch completion (epoch mismatch)"
            );
            return Completion::Stale;
        }

        match result {
            Err(error) => {
                tracing::warn!(epoch, category = %self.filter, error = %error, "Fetch-more failed");
                self.state = PageState::Idle;
                self.error = Some(error.clone());
                Completion::Failed(error)
            }
            Ok(batch) => {
                let returned = batch.items.len();
                let (added, duplicates) = self.page.append(batch.items);
                if duplicates > 0 {
                    tracing::debug!(epoch, duplicates, "Dropped duplicate ids from fetched batch");
                }

                let reached_ceiling = self.page.len() >= self.max_items;
                let exhausted = !batch.has_more || returned == 0 || reached_ceiling;
                if exhausted {
                    self.state = PageState::Exhausted;
                    tracing::info!(
                        epoch,
                        category = %self.filter,
                        count = self.page.len(),
                        source_has_more = batch.has_more,
                        reached_ceiling,
                        "Feed exhausted"
                    );
                } else {
                    self.state = PageState::Idle;
                }

                tracing::debug!(epoch, added, count = self.page.len(), "Fetch-more applied");
                Completion::Applied {
                    added,
                    duplicates,
                    has_more: !exhausted,
                }
            }
        }
    }

    /// End the session: any in-flight completion is dropped and further
    /// requests are refused.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.epoch = self.epoch.wrapping_add(1);
        if self.state == PageState::Loading {
            self.state = PageState::Idle;
        }
        tracing::debug!(epoch = self.epoch, "Feed session closed");
    }

    pub fn loading_state(&self) -> LoadingState {
        LoadingState {
            is_loading: self.state == PageState::Loading,
            has_more: self.state != PageState::Exhausted,
            error: self.error.clone(),
        }
    }

    pub fn take_error(&mut self) -> Option<FetchError> {
        self.error.take()
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn page(&self) -> &FeedPage {
        &self.page
    }

    pub fn items(&self) -> &[FeedItem] {
        self.page.items()
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
