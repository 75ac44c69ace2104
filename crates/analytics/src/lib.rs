//! # Stockdash Metrics Engine
//!
//! This crate turns raw market data for one symbol into the summary values the
//! dashboard renders.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** Neither the `MetricsEngine` nor the normalization functions
//!   keep state between calls. Identical input always produces identical output, and no
//!   call performs I/O.
//!
//! ## Public API
//!
//! - `MetricsEngine`: derives extrema and average volume from a `Series`.
//! - `normalize_quote`: reconciles upstream field-naming conventions into a `Quote`.
//! - `merge_latest_bar`: fills a quote's missing session fields from the latest bar.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod normalize;

// Re-export the key components to create a clean, public-facing API.
pub use engine::MetricsEngine;
pub use error::AnalyticsError;
pub use normalize::{
    merge_latest_bar, normalize_quote, normalize_quote_with, FieldRule, QuoteField,
    RECONCILIATION_TABLE,
};
