//! Async runner for a [`FeedSession`].
//!
//! Fetch tickets are executed on background tokio tasks. Each task reports
//! back through an mpsc channel as a [`FeedEvent`] tagged with the epoch it
//! was started under, and the driver feeds that into the session, where a
//! mismatched epoch is dropped. Underlying fetches are never aborted; a
//! category switch or [`FeedDriver::end`] only suppresses their results.

use super::item::{CategoryFilter, FeedItem, SortCriterion};
use super::pagination::{Completion, FetchTicket, LoadingState};
use super::session::FeedSession;
use super::source::{FetchError, FetchedBatch};
use super::trigger::ScrollPosition;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::mpsc;

/// Capacity of the completion channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Events sent from background fetch tasks.
#[derive(Debug)]
pub enum FeedEvent {
    /// A fetch-more call resolved.
    ///
    /// Fields:
    /// - `epoch`: The session epoch when the fetch was started
    /// - `result`: The batch, or why the fetch failed
    FetchCompleted {
        epoch: u64,
        result: Result<FetchedBatch, FetchError>,
    },
}

/// Wraps a future to catch panics and convert them to errors.
///
/// A fetch task that panics would otherwise never report back and leave the
/// page loading forever.
async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            }
        })
}

pub struct FeedDriver {
    session: FeedSession,
    fetch_timeout: Duration,
    event_tx: mpsc::Sender<FeedEvent>,
    event_rx: mpsc::Receiver<FeedEvent>,
}

impl FeedDriver {
    pub fn new(session: FeedSession, fetch_timeout: Duration) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session,
            fetch_timeout,
            event_tx,
            event_rx,
        }
    }

    pub fn session(&self) -> &FeedSession {
        &self.session
    }

    pub fn display_list(&self) -> Vec<&FeedItem> {
        self.session.display_list()
    }

    pub fn loading_state(&self) -> LoadingState {
        self.session.loading_state()
    }

    pub fn set_category(&mut self, filter: CategoryFilter) -> bool {
        self.session.set_category(filter)
    }

    pub fn set_sort_criterion(&mut self, sort: SortCriterion) {
        self.session.set_sort_criterion(sort);
    }

    /// Feed a scroll event; returns whether a fetch was started.
    ///
    /// Must be called from within a tokio runtime.
    pub fn notify_scroll_position(&mut self, position: ScrollPosition) -> bool {
        let ticket = self.session.notify_scroll_position(position);
        self.dispatch(ticket)
    }

    /// Explicit fetch-more; returns whether a fetch was started.
    pub fn request_more(&mut self) -> bool {
        let ticket = self.session.request_more();
        self.dispatch(ticket)
    }

    fn dispatch(&mut self, ticket: Option<FetchTicket>) -> bool {
        match ticket {
            Some(ticket) => {
                self.spawn_fetch(ticket);
                true
            }
            None => false,
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let FetchTicket {
            epoch,
            continuation,
        } = ticket;
        let fetch = self.session.source().fetch_more(continuation);
        let timeout = self.fetch_timeout;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let tx = self.event_tx.clone();

        tracing::debug!(epoch, timeout_ms, "Spawning fetch-more task");

        tokio::spawn(async move {
            let result = match catch_task_panic(tokio::time::timeout(timeout, fetch)).await {
                Ok(Ok(result)) => result,
                Ok(Err(_elapsed)) => Err(FetchError::Timeout(timeout_ms)),
                Err(panic_msg) => {
                    tracing::error!(epoch, error = %panic_msg, "Fetch task panicked");
                    Err(FetchError::TaskPanicked(panic_msg))
                }
            };

            if let Err(e) = tx.send(FeedEvent::FetchCompleted { epoch, result }).await {
                tracing::warn!(epoch, error = %e, "Failed to send fetch completion (receiver dropped)");
            }
        });
    }

    /// Apply one event to the session.
    pub fn handle_event(&mut self, event: FeedEvent) -> Completion {
        match event {
            FeedEvent::FetchCompleted { epoch, result } => self.session.complete(epoch, result),
        }
    }

    /// Wait for the next fetch task to report and apply it.
    ///
    /// Stale completions are applied (and ignored by the session) like any
    /// other, so this may return [`Completion::Stale`].
    pub async fn next_completion(&mut self) -> Option<Completion> {
        let event = self.event_rx.recv().await?;
        Some(self.handle_event(event))
    }

    /// Wait until the current epoch's fetch has been applied.
    ///
    /// Returns `None` immediately when nothing is loading. Stale completions
    /// arriving in the meantime are consumed and dropped.
    pub async fn settle(&mut self) -> Option<Completion> {
        while self.session.loading_state().is_loading {
            match self.next_completion().await? {
                Completion::Stale => continue,
                completion => return Some(completion),
            }
        }
        None
    }

    /// End the session; results of fetches still running are discarded.
    pub fn end(&mut self) {
        self.session.end();
    }
}
