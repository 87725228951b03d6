use super::fixture::{community_seed, explore_seed};
use super::item::{Category, CategoryFilter, FeedItem};
use super::profile::{FeedProfile, COMMUNITY_DEFAULT_TAB};
use super::source::{Continuation, FeedSource, FetchError, FetchedBatch};
use futures::future::BoxFuture;
use futures::FutureExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

/// How a generated source answers [`FeedSource::seed`].
#[derive(Debug, Clone)]
pub enum SeedBatch {
    /// One launch batch; each category sees the items tagged with it.
    Shared(Vec<FeedItem>),
    /// Every category opens with the same items, retagged to that category.
    Retagged(Vec<FeedItem>),
}

impl SeedBatch {
    fn len(&self) -> usize {
        match self {
            Self::Shared(items) | Self::Retagged(items) => items.len(),
        }
    }
}

struct GeneratorState {
    rng: StdRng,
    next_serial: usize,
}

/// A pseudo-random route generator standing in for a backend.
///
/// Output is fully determined by `rng_seed`, `now_ms` and the sequence of
/// requests, so sessions built on it are reproducible. Items fetched for a
/// specific category are tagged with it; items fetched for "all" draw a
/// category from `categories`. The source never reports exhaustion on its
/// own, leaving that to the page ceiling.
pub struct GeneratedSource {
    state: Mutex<GeneratorState>,
    categories: Vec<Category>,
    seed: SeedBatch,
    id_prefix: String,
    title_prefix: String,
    author_prefix: String,
    page_size: usize,
    latency: Duration,
    now_ms: i64,
}

impl GeneratedSource {
    pub fn new(
        seed: SeedBatch,
        categories: Vec<Category>,
        page_size: usize,
        rng_seed: u64,
        now_ms: i64,
    ) -> Self {
        Self {
            state: Mutex::new(GeneratorState {
                rng: StdRng::seed_from_u64(rng_seed),
                next_serial: seed.len() + 1,
            }),
            categories,
            seed,
            id_prefix: String::new(),
            title_prefix: "探索新路线".to_string(),
            author_prefix: "探路人_".to_string(),
            page_size: page_size.max(1),
            latency: Duration::ZERO,
            now_ms,
        }
    }

    /// Explore feed: the three launch routes, then random routes.
    ///
    /// `categories` should not include the "all" label.
    pub fn explore(
        profile: &FeedProfile,
        categories: Vec<Category>,
        rng_seed: u64,
        now_ms: i64,
    ) -> Self {
        Self::new(
            SeedBatch::Shared(explore_seed(now_ms)),
            categories,
            profile.page_size,
            rng_seed,
            now_ms,
        )
        .with_latency(profile.fetch_latency())
    }

    /// Community feed: four launch posts per tab, then `d`-numbered posts.
    pub fn community(profile: &FeedProfile, rng_seed: u64, now_ms: i64) -> Self {
        let launch = community_seed(&Category::from(COMMUNITY_DEFAULT_TAB), now_ms);
        let mut source = Self::new(
            SeedBatch::Retagged(launch),
            vec![Category::from(COMMUNITY_DEFAULT_TAB)],
            profile.page_size,
            rng_seed,
            now_ms,
        )
        .with_latency(profile.fetch_latency());
        source.id_prefix = "d".to_string();
        source.title_prefix = "发现新的旅程".to_string();
        source.author_prefix = "探索者_".to_string();
        source
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn generate(&self, continuation: &Continuation) -> Result<Vec<FeedItem>, FetchError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| FetchError::Source("generator state poisoned".to_string()))?;

        let mut items = Vec::with_capacity(self.page_size);
        for _ in 0..self.page_size {
            let serial = state.next_serial;
            state.next_serial += 1;

            let category = match &continuation.category {
                CategoryFilter::Only(category) => category.clone(),
                CategoryFilter::All => self
                    .categories
                    .choose(&mut state.rng)
                    .cloned()
                    .unwrap_or_else(|| Category::from(COMMUNITY_DEFAULT_TAB)),
            };
            let km: f64 = state.rng.gen_range(2.0..12.0);
            let rating = (state.rng.gen_range(4.0..=5.0_f64) * 10.0).round() / 10.0;
            let age_ms: i64 = state.rng.gen_range(0..1_000_000_000);
            let hours: u32 = state.rng.gen_range(1..=5);
            let climb: u32 = state.rng.gen_range(0..500);

            items.push(
                FeedItem::new(
                    format!("{}{serial}", self.id_prefix),
                    category.as_str(),
                    rating,
                    format!("{km:.1}km"),
                    self.now_ms - age_ms,
                )
                .with_title(format!("{} #{serial}", self.title_prefix))
                .with_author(format!("{}{serial}", self.author_prefix))
                .with_route_stats(format!("{hours}h"), format!("{climb}m")),
            );
        }
        Ok(items)
    }
}

impl FeedSource for GeneratedSource {
    fn seed(&self, category: &CategoryFilter) -> Vec<FeedItem> {
        match (&self.seed, category) {
            (SeedBatch::Shared(items), _) | (SeedBatch::Retagged(items), CategoryFilter::All) => {
                items
                    .iter()
                    .filter(|item| category.matches(item))
                    .cloned()
                    .collect()
            }
            (SeedBatch::Retagged(items), CategoryFilter::Only(tab)) => items
                .iter()
                .map(|item| FeedItem {
                    category: tab.clone(),
                    ..item.clone()
                })
                .collect(),
        }
    }

    fn fetch_more(
        &self,
        continuation: Continuation,
    ) -> BoxFuture<'static, Result<FetchedBatch, FetchError>> {
        let result = self
            .generate(&continuation)
            .map(|items| FetchedBatch::new(items, true));
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

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000_000;

    fn explore_categories() -> Vec<Category> {
        ["City Walk", "徒步登山", "骑行"].into_iter().map(Category::from).collect()
    }

    fn continuation(count: usize, category: CategoryFilter) -> Continuation {
        Continuation {
            count,
            category,
            last_id: None,
        }
    }

    #[tokio::test]
    async fn test_same_seed_same_batches() {
        let profile = FeedProfile::explore();
        let a = GeneratedSource::explore(&profile, explore_categories(), 7, NOW).with_latency(Duration::ZERO);
        let b = GeneratedSource::explore(&profile, explore_categories(), 7, NOW).with_latency(Duration::ZERO);

        let first = a.fetch_more(continuation(3, CategoryFilter::All)).await.unwrap();
        let second = b.fetch_more(continuation(3, CategoryFilter::All)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.items.len(), 3);
        assert!(first.has_more);
    }

    #[tokio::test]
    async fn test_generated_values_stay_in_range() {
        let profile = FeedProfile::explore();
        let source = GeneratedSource::explore(&profile, explore_categories(), 42, NOW).with_latency(Duration::ZERO);

        for count in [3, 6, 9, 12] {
            let batch = source.fetch_more(continuation(count, CategoryFilter::All)).await.unwrap();
            for item in &batch.items {
                assert!((4.0..=5.0).contains(&item.rating), "rating {}", item.rating);
                assert!((2.0..=12.0).contains(&item.distance_km()));
                assert!(item.timestamp <= NOW);
                assert!(explore_categories().contains(&item.category));
            }
        }
    }

    #[tokio::test]
    async fn test_ids_never_repeat_seed_ids() {
        let profile = FeedProfile::explore();
        let source = GeneratedSource::explore(&profile, explore_categories(), 1, NOW).with_latency(Duration::ZERO);
        let city = CategoryFilter::Only(Category::from("City Walk"));

        let seed = source.seed(&city);
        assert_eq!(seed.len(), 1);

        let batch = source.fetch_more(continuation(seed.len(), city)).await.unwrap();
        let ids: Vec<&str> = batch.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "5", "6"]);
        assert!(batch.items.iter().all(|i| i.category.as_str() == "City Walk"));
    }

    #[test]
    fn test_community_seed_retagged_per_tab() {
        let source = GeneratedSource::community(&FeedProfile::community(), 1, NOW);
        let nearby = CategoryFilter::Only(Category::from("nearby"));
        let seed = source.seed(&nearby);
        assert_eq!(seed.len(), 4);
        assert!(seed.iter().all(|item| nearby.matches(item)));
    }

    #[tokio::test]
    async fn test_community_ids_are_prefixed() {
        let source = GeneratedSource::community(&FeedProfile::community(), 1, NOW).with_latency(Duration::ZERO);
        let batch = source
            .fetch_more(continuation(4, CategoryFilter::Only(Category::from("follow"))))
            .await
            .unwrap();
        let ids: Vec<&str> = batch.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["d5", "d6"]);
    }
}
