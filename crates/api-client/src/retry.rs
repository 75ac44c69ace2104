use crate::QuoteSource;
use crate::error::ApiError;
use async_trait::async_trait;
use configuration::{QuoteSourceConfig, RetryConfig};
use core_types::{RawQuote, Series};
use std::future::Future;
use std::time::Duration;

/// Bounded retry with a fixed delay, plus a timeout applied to every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(retry: &RetryConfig, source: &QuoteSourceConfig) -> Self {
        Self {
            max_attempts: retry.max_attempts,
            delay: retry.delay(),
            timeout: source.timeout(),
        }
    }
}

/// Runs `op` until it succeeds, fails permanently, or runs out of attempts.
///
/// Only errors for which [`ApiError::is_transient`] holds are retried. An attempt
/// that exceeds `policy.timeout` counts as a transient [`ApiError::Timeout`].
/// When attempts are exhausted the last error is returned.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let outcome = match tokio::time::timeout(policy.timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(policy.timeout)),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                tracing::warn!(
                    operation = label,
                    attempt,
                    max_attempts,
                    error = %e,
                    "Transient upstream failure. Retrying in {:?}.",
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Decorates any [`QuoteSource`] so that every call goes through [`retry`].
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: QuoteSource> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<S: QuoteSource> QuoteSource for RetryingSource<S> {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, ApiError> {
        let label = format!("fetch_quote({symbol})");
        retry(&self.policy, &label, || self.inner.fetch_quote(symbol)).await
    }

    async fn fetch_history(&self, symbol: &str, days: u32) -> Result<Series, ApiError> {
        let label = format!("fetch_history({symbol})");
        retry(&self.policy, &label, || self.inner.fetch_history(symbol, days)).await
    }
}
