use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// A distance label with no leading numeric magnitude (e.g. "km", "far").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed distance label: {0:?}")]
pub struct MalformedDistance(pub String);

/// A sort criterion string that is not one of `latest`, `rating`, `distance`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown sort criterion: {0:?} (expected latest, rating or distance)")]
pub struct UnknownSortCriterion(pub String);

// ============================================================================
// Identity and Category
// ============================================================================

/// Stable unique key of a feed item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A category label such as "City Walk" or "徒步登山".
///
/// The set of labels is supplied externally; the engine only compares them
/// for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

/// Active category selection of a feed: everything, or a single label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Resolve a UI label, where `all_label` (e.g. "发现") stands for [`CategoryFilter::All`].
    pub fn from_label(label: &str, all_label: &str) -> Self {
        if label == all_label {
            Self::All
        } else {
            Self::Only(Category::from(label))
        }
    }

    pub fn matches(&self, item: &FeedItem) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => item.category == *category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Only(category) => fmt::Display::fmt(category, f),
        }
    }
}

// ============================================================================
// Distance
// ============================================================================

/// Parse the leading magnitude of a distance label, ignoring the unit suffix.
///
/// Always uses `.` as the decimal separator regardless of locale, so
/// `"4.5km"` is `4.5` and `"1,5km"` is `1.0`. Labels with no leading number
/// are rejected.
pub fn parse_distance_km(label: &str) -> Result<f64, MalformedDistance> {
    let trimmed = label.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in trimmed.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !seen_digit {
        return Err(MalformedDistance(label.to_string()));
    }

    trimmed[..end]
        .parse::<f64>()
        .ok()
        .filter(|km| km.is_finite())
        .ok_or_else(|| MalformedDistance(label.to_string()))
}

/// Display label of a route distance together with its parsed magnitude.
///
/// Serializes as the bare label. Malformed labels keep their text for display
/// and order as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Distance {
    label: String,
    km: f64,
}

impl Distance {
    /// Ordering key used for malformed labels.
    pub const SENTINEL_KM: f64 = 0.0;

    pub fn parse(label: impl Into<String>) -> Self {
        let label = label.into();
        let km = match parse_distance_km(&label) {
            Ok(km) => km,
            Err(e) => {
                tracing::debug!(error = %e, "Using sentinel distance for malformed label");
                Self::SENTINEL_KM
            }
        };
        Self { label, km }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn km(&self) -> f64 {
        self.km
    }
}

impl From<String> for Distance {
    fn from(label: String) -> Self {
        Self::parse(label)
    }
}

impl From<Distance> for String {
    fn from(distance: Distance) -> Self {
        distance.label
    }
}

// ============================================================================
// Sort Criterion
// ============================================================================

/// Ordering applied to the display list. All orderings are descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortCriterion {
    /// Newest first by timestamp.
    #[default]
    Latest,
    /// Highest rating first.
    Rating,
    /// Longest route first.
    Distance,
}

impl SortCriterion {
    pub const ALL: [SortCriterion; 3] = [Self::Latest, Self::Rating, Self::Distance];

    /// Label shown on the sort menu button.
    pub fn label(self) -> &'static str {
        match self {
            Self::Latest => "最新发布",
            Self::Rating => "评分最高",
            Self::Distance => "距离最长",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Rating => "rating",
            Self::Distance => "distance",
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortCriterion {
    type Err = UnknownSortCriterion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "rating" => Ok(Self::Rating),
            "distance" => Ok(Self::Distance),
            _ => Err(UnknownSortCriterion(s.to_string())),
        }
    }
}

// ============================================================================
// Feed Item
// ============================================================================

/// A single route card in a feed.
///
/// `synthesized_at` is assigned by the page on append and records arrival
/// order; values supplied by a source are overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: ItemId,
    pub category: Category,
    pub rating: f64,
    pub distance: Distance,
    /// Publish instant in milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub synthesized_at: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// Estimated walking time label, e.g. "1.5h".
    #[serde(default)]
    pub duration: String,
    /// Elevation gain label, e.g. "124m".
    #[serde(default)]
    pub climb: String,
}

impl FeedItem {
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        rating: f64,
        distance: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: ItemId::new(id),
            category: Category::new(category),
            rating,
            distance: Distance::parse(distance),
            timestamp,
            synthesized_at: 0,
            title: String::new(),
            author: String::new(),
            duration: String::new(),
            climb: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_route_stats(mut self, duration: impl Into<String>, climb: impl Into<String>) -> Self {
        self.duration = duration.into();
        self.climb = climb.into();
        self
    }

    pub fn distance_km(&self) -> f64 {
        self.distance.km()
    }
}
