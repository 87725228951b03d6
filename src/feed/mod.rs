//! Incremental feed engine for the route discovery screens.
//!
//! This module owns everything with behavior behind a feed screen:
//!
//! - **Filtering and sorting**: deriving the display list from the loaded items
//! - **Pagination**: the idle/loading/exhausted state machine behind fetch-more
//! - **Scroll trigger**: turning scroll geometry into fetch-more requests
//! - **Sources**: the data capability a feed is built on, plus generated and
//!   fixture-backed implementations
//!
//! # Architecture
//!
//! - [`engine`] - Pure filter/sort over a borrowed item slice
//! - [`pagination`] - Epoch-guarded controller owning the page
//! - [`session`] - One screen's session; the surface the UI talks to
//! - [`driver`] - Runs a session's fetches on tokio tasks
//!
//! # Example
//!
//! ```ignore
//! use trailfeed::feed::{FeedDriver, FeedProfile, FeedSession, GeneratedSource, ScrollPosition};
//!
//! let profile = FeedProfile::explore();
//! let source = Arc::new(GeneratedSource::explore(&profile, categories, 7, now_ms));
//! let session = FeedSession::new(source, &profile, CategoryFilter::All, SortCriterion::Latest);
//! let mut driver = FeedDriver::new(session, profile.fetch_timeout());
//!
//! if driver.notify_scroll_position(ScrollPosition::new(900.0, 800.0, 1750.0)) {
//!     driver.settle().await;
//! }
//! ```

pub mod driver;
pub mod engine;
mod fixture;
mod generated;
mod item;
pub mod pagination;
mod profile;
pub mod session;
mod source;
mod trigger;

pub use driver::{FeedDriver, FeedEvent};
pub use engine::derive;
pub use fixture::{community_seed, explore_seed, FixtureError, FixtureSource};
pub use generated::{GeneratedSource, SeedBatch};
pub use item::{
    parse_distance_km, Category, CategoryFilter, Distance, FeedItem, ItemId, MalformedDistance,
    SortCriterion, UnknownSortCriterion,
};
pub use pagination::{
    Completion, FeedPage, FetchTicket, LoadingState, PageState, PaginationController,
    DEFAULT_MAX_ITEMS,
};
pub use profile::{
    FeedProfile, COMMUNITY_DEFAULT_TAB, COMMUNITY_TABS, EXPLORE_ALL_LABEL, EXPLORE_CATEGORIES,
};
pub use session::{FeedSession, DEFAULT_SEED_CACHE_CAPACITY};
pub use source::{Continuation, FeedSource, FetchError, FetchedBatch};
pub use trigger::{ScrollPosition, ScrollTrigger};
