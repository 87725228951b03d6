//! Incremental feed engine for route discovery screens.
//!
//! - [`feed`] - Filtering, sorting, scroll-driven pagination and data sources
//! - [`config`] - Optional TOML configuration
//! - [`util`] - Text and time helpers for rendering cards

pub mod config;
pub mod feed;
pub mod util;
