use crate::error::ApiError;
use async_trait::async_trait;
use core_types::{RawQuote, Series};
use std::sync::Arc;

pub mod error;
pub mod responses;
pub mod retry;
pub mod yahoo;
// --- Public API ---
pub use retry::{RetryPolicy, RetryingSource, retry};
pub use yahoo::YahooClient;

/// The generic, abstract interface for an upstream finance-data provider.
/// This trait is the contract that the dashboard uses, allowing the
/// underlying implementation (live or fake) to be swapped out.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetches the latest quote record for one symbol, in the provider's own field names.
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, ApiError>;

    /// Fetches the trailing `days` of daily bars, oldest first.
    async fn fetch_history(&self, symbol: &str, days: u32) -> Result<Series, ApiError>;
}

#[async_trait]
impl<S: QuoteSource + ?Sized> QuoteSource for Arc<S> {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, ApiError> {
        (**self).fetch_quote(symbol).await
    }

    async fn fetch_history(&self, symbol: &str, days: u32) -> Result<Series, ApiError> {
        (**self).fetch_history(symbol, days).await
    }
}
