use super::item::{CategoryFilter, FeedItem, ItemId};
use futures::future::BoxFuture;
use thiserror::Error;

/// Errors a feed source can report for a fetch-more request.
///
/// All of them are recoverable: the page returns to idle and the next
/// request retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The source did not answer within the configured timeout
    #[error("Fetch timed out after {0} ms")]
    Timeout(u64),
    /// The source rejected the request
    #[error("Feed source error: {0}")]
    Source(String),
    /// The task running the fetch panicked
    #[error("Fetch task panicked: {0}")]
    TaskPanicked(String),
}

/// Cursor handed to [`FeedSource::fetch_more`] describing what the page holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    /// Number of items currently in the page (seed included).
    pub count: usize,
    pub category: CategoryFilter,
    /// Id of the most recently appended item, if any.
    pub last_id: Option<ItemId>,
}

/// One resolved fetch-more batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedBatch {
    pub items: Vec<FeedItem>,
    /// False when the source has nothing beyond this batch.
    pub has_more: bool,
}

impl FetchedBatch {
    pub fn new(items: Vec<FeedItem>, has_more: bool) -> Self {
        Self { items, has_more }
    }
}

/// Data capability a feed session is built on.
///
/// `fetch_more` must resolve exactly once with a complete batch or an error;
/// partial results are not part of the contract. The returned future owns
/// everything it needs so it can run on a background task.
pub trait FeedSource: Send + Sync {
    /// Initial batch shown when a category becomes active.
    fn seed(&self, category: &CategoryFilter) -> Vec<FeedItem>;

    fn fetch_more(
        &self,
        continuation: Continuation,
    ) -> BoxFuture<'static, Result<FetchedBatch, FetchError>>;
}
