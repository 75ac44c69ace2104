use crate::error::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub quote_source: QuoteSourceConfig,
    pub retry: RetryConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

/// Where the HTTP API listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Connection settings for the upstream finance-data API.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSourceConfig {
    /// Base URL of the API, without a trailing slash.
    pub base_url: String,
    /// Per-attempt request timeout.
    pub timeout_secs: u64,
    /// Length of the trailing window of daily bars to fetch.
    pub history_days: u32,
    pub user_agent: String,
    /// Visited once per session to obtain the cookie the quote endpoint's crumb is tied to.
    pub cookie_url: String,
}

impl QuoteSourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Bounded retry with a fixed delay between attempts.
/// Only transient upstream failures are retried.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Contains parameters for the dashboard refresh cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// The symbols shown on the dashboard, in display order.
    pub symbols: Vec<String>,
    /// How many symbols may be fetched at the same time.
    /// The default of 1 keeps requests strictly sequential to stay under upstream rate limits.
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    /// Multi-field human readable lines.
    Full,
    /// Shorter lines, useful when a terminal is narrow.
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as `info` or `stockdash=debug,tower_http=info`.
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
}

impl Config {
    /// Rejects values that would make the application misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.max_concurrent_requests == 0 {
            return Err(ConfigError::ValidationError(
                "dashboard.max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.quote_source.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "quote_source.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.quote_source.history_days == 0 {
            return Err(ConfigError::ValidationError(
                "quote_source.history_days must be at least 1".to_string(),
            ));
        }
        if self.quote_source.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "quote_source.base_url must not be empty".to_string(),
            ));
        }
        if let Some(empty) = self.dashboard.symbols.iter().find(|s| s.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "dashboard.symbols contains an empty entry ({empty:?})"
            )));
        }
        Ok(())
    }
}
