//! Deterministic feed data: the built-in launch batches and a fixture-backed source.

use super::item::{Category, CategoryFilter, FeedItem};
use super::source::{Continuation, FeedSource, FetchError, FetchedBatch};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 24 * HOUR_MS;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid fixture JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Launch Batches
// ============================================================================

/// The three featured routes the explore screen opens with.
pub fn explore_seed(now_ms: i64) -> Vec<FeedItem> {
    vec![
        FeedItem::new("1", "发现", 4.9, "4.5km", now_ms - 2 * HOUR_MS)
            .with_title("京都深处的秘密茶室徒步")
            .with_author("TravelGuru")
            .with_route_stats("1.5h", "124m"),
        FeedItem::new("2", "City Walk", 4.8, "8.2km", now_ms - DAY_MS)
            .with_title("厦门：海岸线漫步与隐世风景")
            .with_author("小林在路上")
            .with_route_stats("3h", "45m"),
        FeedItem::new("3", "徒步登山", 5.0, "15.0km", now_ms - 3 * DAY_MS)
            .with_title("武功山云海徒步挑战")
            .with_author("巅峰行者")
            .with_route_stats("6h", "850m"),
    ]
}

/// The four posts every community tab opens with, tagged with `tab`.
pub fn community_seed(tab: &Category, now_ms: i64) -> Vec<FeedItem> {
    let posts = [
        ("d1", "静安寺周边的藏宝路线，这几个机位绝了！", "阿强在漫步"),
        ("d2", "周末去哪儿？发现一个神仙徒步地", "小林"),
        ("d3", "秋天的第一场Citywalk，从梧桐大道开始", "摄影师木木"),
        ("d4", "新手徒步装备避雷指南！别再乱买啦", "徒步小白"),
    ];
    posts
        .iter()
        .zip(1i64..)
        .map(|(&(id, title, author), age)| {
            FeedItem::new(id, tab.as_str(), 4.5, "5.2km", now_ms - age * HOUR_MS)
                .with_title(title)
                .with_author(author)
                .with_route_stats("2h", "80m")
        })
        .collect()
}

// ============================================================================
// Fixture Source
// ============================================================================

#[derive(Debug, Deserialize)]
struct FixtureFile {
    #[serde(default = "default_seed_len")]
    seed_len: usize,
    items: Vec<FeedItem>,
}

fn default_seed_len() -> usize {
    3
}

/// A source paging through a fixed item list.
///
/// For a category, the first `seed_len` matching items form the seed and each
/// fetch returns the next `page_size` matching items after
/// `continuation.count`. Queued failures are returned before any batch.
pub struct FixtureSource {
    items: Vec<FeedItem>,
    seed_len: usize,
    page_size: usize,
    latency: Duration,
    failures: Mutex<VecDeque<FetchError>>,
    fetch_calls: AtomicUsize,
}

impl FixtureSource {
    pub fn new(items: Vec<FeedItem>, seed_len: usize, page_size: usize) -> Self {
        Self {
            items,
            seed_len,
            page_size: page_size.max(1),
            latency: Duration::ZERO,
            failures: Mutex::new(VecDeque::new()),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Load `{"seed_len": 3, "items": [...]}` from a JSON file.
    pub fn load(path: &Path, page_size: usize) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path)?;
        let file: FixtureFile = serde_json::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            items = file.items.len(),
            seed_len = file.seed_len,
            "Loaded feed fixture"
        );
        Ok(Self::new(file.items, file.seed_len, page_size))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next fetch fail with `error`.
    pub fn inject_failure(&self, error: FetchError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(error);
        }
    }

    /// Number of `fetch_more` calls received so far.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn matching(&self, category: &CategoryFilter) -> Vec<&FeedItem> {
        self.items.iter().filter(|item| category.matches(item)).collect()
    }
}

impl FeedSource for FixtureSource {
    fn seed(&self, category: &CategoryFilter) -> Vec<FeedItem> {
        self.matching(category)
            .into_iter()
            .take(self.seed_len)
            .cloned()
            .collect()
    }

    fn fetch_more(
        &self,
        continuation: Continuation,
    ) -> BoxFuture<'static, Result<FetchedBatch, FetchError>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let injected = self
            .failures
            .lock()
            .ok()
            .and_then(|mut failures| failures.pop_front());

        let result = match injected {
            Some(error) => Err(error),
            None => {
                let matching = self.matching(&continuation.category);
                let start = continuation.count.min(matching.len());
                let end = (start + self.page_size).min(matching.len());
                let items = matching[start..end].iter().map(|&item| item.clone()).collect();
                Ok(FetchedBatch::new(items, end < matching.len()))
            }
        };

        let latency = self.latency;
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            result
        }
        .boxed()
    }
}
