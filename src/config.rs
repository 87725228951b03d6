//! Configuration file parser for ~/.config/trailfeed/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use crate::feed::{Category, CategoryFilter, FeedProfile, EXPLORE_ALL_LABEL, EXPLORE_CATEGORIES};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A value parsed but is out of range.
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Per-screen overrides of a [`FeedProfile`] preset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProfileOverrides {
    pub page_size: Option<usize>,
    pub max_items: Option<usize>,
    pub scroll_threshold: Option<f64>,
    pub fetch_latency_ms: Option<u64>,
    pub fetch_timeout_ms: Option<u64>,
}

impl ProfileOverrides {
    /// Overlay the keys present in the file onto `base`.
    pub fn apply(&self, base: FeedProfile) -> FeedProfile {
        FeedProfile {
            page_size: self.page_size.unwrap_or(base.page_size),
            max_items: self.max_items.unwrap_or(base.max_items),
            scroll_threshold: self.scroll_threshold.unwrap_or(base.scroll_threshold),
            fetch_latency_ms: self.fetch_latency_ms.unwrap_or(base.fetch_latency_ms),
            fetch_timeout_ms: self.fetch_timeout_ms.unwrap_or(base.fetch_timeout_ms),
        }
    }
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Category label that selects every category (e.g. "发现").
    pub all_label: String,

    /// Category tags offered on the explore screen, in display order.
    pub categories: Vec<String>,

    /// Number of per-category seed batches cached by a session.
    pub seed_cache_capacity: usize,

    /// Overrides for the explore screen's pagination.
    pub explore: ProfileOverrides,

    /// Overrides for the community screen's pagination.
    pub community: ProfileOverrides,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            all_label: EXPLORE_ALL_LABEL.to_string(),
            categories: EXPLORE_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            seed_cache_capacity: 8,
            explore: ProfileOverrides::default(),
            community: ProfileOverrides::default(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Out-of-range values → `Err(ConfigError::Invalid)`
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to avoid loading a huge or corrupted file
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "all_label",
                "categories",
                "seed_cache_capacity",
                "explore",
                "community",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            categories = config.categories.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.seed_cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "seed_cache_capacity must be at least 1".to_string(),
            ));
        }
        for (screen, profile) in [
            ("explore", self.explore_profile()),
            ("community", self.community_profile()),
        ] {
            if profile.page_size == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{screen}.page_size must be at least 1"
                )));
            }
            if profile.max_items == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{screen}.max_items must be at least 1"
                )));
            }
            if !profile.scroll_threshold.is_finite() || profile.scroll_threshold < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{screen}.scroll_threshold must be a non-negative number, got {}",
                    profile.scroll_threshold
                )));
            }
        }
        Ok(())
    }

    pub fn explore_profile(&self) -> FeedProfile {
        self.explore.apply(FeedProfile::explore())
    }

    pub fn community_profile(&self) -> FeedProfile {
        self.community.apply(FeedProfile::community())
    }

    pub fn seed_cache_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.seed_cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    /// Resolve an explore tag, mapping `all_label` to every category.
    pub fn category_filter(&self, label: &str) -> CategoryFilter {
        CategoryFilter::from_label(label, &self.all_label)
    }

    /// Concrete categories a generated "all" batch draws from.
    pub fn concrete_categories(&self) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|label| **label != self.all_label)
            .map(|label| Category::from(label.as_str()))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.all_label, "发现");
        assert_eq!(config.categories.len(), 12);
        assert_eq!(config.seed_cache_capacity, 8);
        assert_eq!(config.explore_profile(), FeedProfile::explore());
        assert_eq!(config.community_profile(), FeedProfile::community());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/trailfeed_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.all_label, "发现");
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("trailfeed_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.seed_cache_capacity, 8);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_profile_overrides_keep_preset() {
        let dir = std::env::temp_dir().join("trailfeed_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[community]\nmax_items = 40\n").unwrap();

        let config = Config::load(&path).unwrap();
        let community = config.community_profile();
        assert_eq!(community.max_items, 40);
        assert_eq!(community.page_size, 2); // preset
        assert_eq!(community.scroll_threshold, 100.0); // preset
        assert_eq!(config.explore_profile(), FeedProfile::explore());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("trailfeed_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
all_label = "全部"
categories = ["全部", "骑行", "露营"]
seed_cache_capacity = 2

[explore]
page_size = 5
max_items = 30
scroll_threshold = 200.0
fetch_latency_ms = 0
fetch_timeout_ms = 2500
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.category_filter("全部"), CategoryFilter::All);
        assert_eq!(
            config.concrete_categories(),
            vec![Category::from("骑行"), Category::from("露营")]
        );
        assert_eq!(config.seed_cache_capacity().get(), 2);

        let explore = config.explore_profile();
        assert_eq!(explore.page_size, 5);
        assert_eq!(explore.max_items, 30);
        assert_eq!(explore.scroll_threshold, 200.0);
        assert_eq!(explore.fetch_latency_ms, 0);
        assert_eq!(explore.fetch_timeout_ms, 2500);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("trailfeed_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("trailfeed_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
all_label = "发现"
totally_fake_key = "should not fail"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.all_label, "发现");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let dir = std::env::temp_dir().join("trailfeed_config_test_zero_page");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[explore]\npage_size = 0\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("explore.page_size"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let dir = std::env::temp_dir().join("trailfeed_config_test_negative_threshold");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[community]\nscroll_threshold = -5.0\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = std::env::temp_dir().join("trailfeed_config_test_wrongtype");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "categories = 42\n").unwrap();

        assert!(Config::load(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("trailfeed_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = "a".repeat(1_048_577);
        std::fs::write(&path, content).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
