use super::pagination::DEFAULT_MAX_ITEMS;
use super::trigger::ScrollTrigger;
use std::time::Duration;

/// Category label meaning "all categories" on the explore screen.
pub const EXPLORE_ALL_LABEL: &str = "发现";

/// Category tags of the explore screen, in display order.
pub const EXPLORE_CATEGORIES: &[&str] = &[
    "发现",
    "City Walk",
    "徒步登山",
    "周末去哪",
    "摄影",
    "骑行",
    "亲子",
    "越野跑",
    "古镇",
    "自驾",
    "美食",
    "露营",
];

/// Community feed tabs as `(category id, display label)`.
pub const COMMUNITY_TABS: &[(&str, &str)] = &[
    ("follow", "关注"),
    ("discover", "发现"),
    ("nearby", "附近"),
];

/// Tab selected when the community screen opens.
pub const COMMUNITY_DEFAULT_TAB: &str = "discover";

/// Pagination tuning for one feed screen.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedProfile {
    /// Items requested per fetch-more call.
    pub page_size: usize,
    /// Cumulative item ceiling per category.
    pub max_items: usize,
    /// Scroll proximity that triggers fetch-more.
    pub scroll_threshold: f64,
    /// Simulated latency of generated sources.
    pub fetch_latency_ms: u64,
    /// Fetches taking longer than this fail with a timeout.
    pub fetch_timeout_ms: u64,
}

impl FeedProfile {
    /// Explore screen: three routes per page, trigger 150 units from the end.
    pub fn explore() -> Self {
        Self {
            page_size: 3,
            max_items: DEFAULT_MAX_ITEMS,
            scroll_threshold: ScrollTrigger::EXPLORE_THRESHOLD,
            fetch_latency_ms: 1500,
            fetch_timeout_ms: 10_000,
        }
    }

    /// Community screen: two posts per page, trigger 100 units from the end.
    pub fn community() -> Self {
        Self {
            page_size: 2,
            max_items: DEFAULT_MAX_ITEMS,
            scroll_threshold: ScrollTrigger::COMMUNITY_THRESHOLD,
            fetch_latency_ms: 1500,
            fetch_timeout_ms: 10_000,
        }
    }

    pub fn fetch_latency(&self) -> Duration {
        Duration::from_millis(self.fetch_latency_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn trigger(&self) -> ScrollTrigger {
        ScrollTrigger::new(self.scroll_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_differ_in_page_size_and_threshold() {
        let explore = FeedProfile::explore();
        let community = FeedProfile::community();
        assert_eq!(explore.page_size, 3);
        assert_eq!(community.page_size, 2);
        assert_eq!(explore.trigger().threshold(), 150.0);
        assert_eq!(community.trigger().threshold(), 100.0);
        assert_eq!(explore.max_items, 20);
        assert_eq!(explore.fetch_latency(), Duration::from_millis(1500));
    }

    #[test]
    fn test_all_label_is_first_category() {
        assert_eq!(EXPLORE_CATEGORIES[0], EXPLORE_ALL_LABEL);
        assert!(COMMUNITY_TABS.iter().any(|(id, _)| *id == COMMUNITY_DEFAULT_TAB));
    }
}
