//! Utility functions for rendering feed cards.
//!
//! This module provides reusable utilities for:
//!
//! - **Text layout**: Unicode-aware width calculation and column fitting
//! - **Time labels**: Relative publish-time labels ("2小时前", "昨天")
//!
//! # Examples
//!
//! ```
//! use trailfeed::util::{display_width, fit_to_width, relative_label};
//!
//! assert_eq!(display_width("徒步"), 4);
//! assert_eq!(fit_to_width("City Walk", 6), "City …");
//! assert_eq!(relative_label(7_200_000, 0), "2小时前");
//! ```

mod text;
mod time;

pub use text::{display_width, fit_to_width, sanitize_line};
pub use time::{now_ms, relative_label};
