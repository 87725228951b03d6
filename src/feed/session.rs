use super::engine::derive;
use super::item::{CategoryFilter, FeedItem, SortCriterion};
use super::pagination::{Completion, FetchTicket, LoadingState, PaginationController};
use super::profile::FeedProfile;
use super::source::{FeedSource, FetchError, FetchedBatch};
use super::trigger::{ScrollPosition, ScrollTrigger};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Default number of per-category seed batches kept by a session.
pub const DEFAULT_SEED_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(8) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

/// One feed screen's state: the page, the active sort and the scroll trigger.
///
/// This is the surface the rendering layer talks to. It is synchronous:
/// operations that start a fetch return the [`FetchTicket`] for the caller to
/// run against [`FeedSession::source`], and the result comes back through
/// [`FeedSession::complete`]. [`FeedDriver`](super::FeedDriver) does that on
/// tokio tasks.
pub struct FeedSession {
    source: Arc<dyn FeedSource>,
    controller: PaginationController,
    sort: SortCriterion,
    trigger: ScrollTrigger,
    seed_cache: LruCache<CategoryFilter, Vec<FeedItem>>,
}

impl FeedSession {
    pub fn new(
        source: Arc<dyn FeedSource>,
        profile: &FeedProfile,
        filter: CategoryFilter,
        sort: SortCriterion,
    ) -> Self {
        Self::with_seed_cache(source, profile, filter, sort, DEFAULT_SEED_CACHE_CAPACITY)
    }

    pub fn with_seed_cache(
        source: Arc<dyn FeedSource>,
        profile: &FeedProfile,
        filter: CategoryFilter,
        sort: SortCriterion,
        seed_cache_capacity: NonZeroUsize,
    ) -> Self {
        let mut seed_cache = LruCache::new(seed_cache_capacity);
        let seed = source.seed(&filter);
        seed_cache.put(filter.clone(), seed.clone());

        tracing::debug!(
            category = %filter,
            sort = %sort,
            page_size = profile.page_size,
            max_items = profile.max_items,
            "Feed session started"
        );

        Self {
            controller: PaginationController::new(filter, seed, profile.max_items),
            source,
            sort,
            trigger: profile.trigger(),
            seed_cache,
        }
    }

    /// Items of the active category in display order.
    pub fn display_list(&self) -> Vec<&FeedItem> {
        derive(self.controller.items(), self.controller.filter(), self.sort)
    }

    pub fn loading_state(&self) -> LoadingState {
        self.controller.loading_state()
    }

    /// Clear the transient error flag after the UI has shown it.
    pub fn take_error(&mut self) -> Option<FetchError> {
        self.controller.take_error()
    }

    pub fn category(&self) -> &CategoryFilter {
        self.controller.filter()
    }

    pub fn sort_criterion(&self) -> SortCriterion {
        self.sort
    }

    pub fn controller(&self) -> &PaginationController {
        &self.controller
    }

    pub fn source(&self) -> &Arc<dyn FeedSource> {
        &self.source
    }

    pub fn trigger(&self) -> ScrollTrigger {
        self.trigger
    }

    /// Switch the active category, resetting the page and reseeding it.
    ///
    /// Selecting the category that is already active changes nothing.
    /// Returns whether a reset happened.
    pub fn set_category(&mut self, filter: CategoryFilter) -> bool {
        if self.controller.is_closed() || *self.controller.filter() == filter {
            return false;
        }
        let seed = self.seed_for(&filter);
        self.controller.switch_category(filter, seed);
        true
    }

    /// Change the ordering. The page is kept as is.
    pub fn set_sort_criterion(&mut self, sort: SortCriterion) {
        if self.sort != sort {
            tracing::debug!(from = %self.sort, to = %sort, "Sort criterion changed");
            self.sort = sort;
        }
    }

    /// Feed a scroll event; returns a ticket if it started a fetch.
    pub fn notify_scroll_position(&mut self, position: ScrollPosition) -> Option<FetchTicket> {
        if !self.trigger.should_fire(position) {
            return None;
        }
        self.controller.request_more()
    }

    /// Explicit fetch-more, e.g. from a retry affordance.
    pub fn request_more(&mut self) -> Option<FetchTicket> {
        self.controller.request_more()
    }

    pub fn complete(
        &mut self,
        epoch: u64,
        result: Result<FetchedBatch, FetchError>,
    ) -> Completion {
        self.controller.complete(epoch, result)
    }

    /// End the session. In-flight results are dropped from now on.
    pub fn end(&mut self) {
        self.controller.close();
        self.seed_cache.clear();
    }

    pub fn is_ended(&self) -> bool {
        self.controller.is_closed()
    }

    fn seed_for(&mut self, filter: &CategoryFilter) -> Vec<FeedItem> {
        if let Some(seed) = self.seed_cache.get(filter) {
            tracing::trace!(category = %filter, "Seed cache hit");
            return seed.clone();
        }
        let seed = self.source.seed(filter);
        self.seed_cache.put(filter.clone(), seed.clone());
        seed
    }
}
