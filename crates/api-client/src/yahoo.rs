use crate::QuoteSource;
use crate::error::ApiError;
use crate::responses::{
    ChartEnvelope, QuoteEnvelope, error_message, parse_chart, parse_chart_meta, parse_quote,
};
use async_trait::async_trait;
use configuration::QuoteSourceConfig;
use core_types::{RawQuote, Series};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A concrete implementation of the `QuoteSource` for the Yahoo Finance public API.
///
/// The quote endpoint only answers requests that carry a session cookie and the
/// matching crumb. The crumb is fetched once and shared by every clone of the client.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: Url,
    cookie_url: Url,
    crumb: Arc<Mutex<Option<String>>>,
}

impl YahooClient {
    pub fn new(config: &QuoteSourceConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidData(format!("Invalid base URL '{}': {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidData(format!(
                "Base URL '{}' cannot carry a path",
                config.base_url
            )));
        }
        let cookie_url = Url::parse(&config.cookie_url).map_err(|e| {
            ApiError::InvalidData(format!("Invalid cookie URL '{}': {e}", config.cookie_url))
        })?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url,
            cookie_url,
            crumb: Arc::new(Mutex::new(None)),
        })
    }

    /// Appends path segments to the base URL. Each segment is escaped, so a symbol can never add path levels.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `cannot_be_a_base` was rejected in `new`, so the segments are always editable.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        symbol: &str,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        tracing::debug!(%url, symbol, "Requesting upstream data.");
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str::<T>(&text)
                .map_err(|e| ApiError::Deserialization(e.to_string()));
        }

        match status {
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(symbol.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(ApiError::RateLimited),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ApiError::Unauthorized(error_message(&text)))
            }
            _ => Err(ApiError::Upstream {
                status: status.as_u16(),
                message: error_message(&text),
            }),
        }
    }

    /// The cached crumb, or a fresh one from a new cookie session.
    ///
    /// The lock is held across the handshake so concurrent callers share one session.
    async fn crumb(&self) -> Result<String, ApiError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // The cookie host usually answers 404; only the cookie it sets matters.
        if let Err(e) = self.client.get(self.cookie_url.clone()).send().await {
            tracing::debug!(error = %e, "Session cookie request failed.");
        }

        let url = self.endpoint(&["v1", "test", "getcrumb"]);
        tracing::debug!(%url, "Requesting a quote crumb.");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let crumb = text.trim();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited);
        }
        if status.is_server_error() {
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        if !status.is_success() || crumb.is_empty() {
            return Err(ApiError::Unauthorized(format!(
                "no crumb issued (HTTP {})",
                status.as_u16()
            )));
        }

        *cached = Some(crumb.to_string());
        Ok(crumb.to_string())
    }

    async fn forget_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    async fn fetch_quote_with_crumb(&self, symbol: &str) -> Result<RawQuote, ApiError> {
        let crumb = self.crumb().await?;
        let url = self.endpoint(&["v7", "finance", "quote"]);
        let query = [("symbols", symbol.to_string()), ("crumb", crumb)];
        let envelope: QuoteEnvelope = self.get_json(symbol, url, &query).await?;
        parse_quote(symbol, envelope)
    }

    /// The chart endpoint needs no crumb. Its metadata lacks market cap and the
    /// day's change, so it only stands in when the quote endpoint refuses us.
    async fn fetch_quote_from_chart(&self, symbol: &str) -> Result<RawQuote, ApiError> {
        let url = self.endpoint(&["v8", "finance", "chart", symbol]);
        let query = [("range", "1d".to_string()), ("interval", "1d".to_string())];
        let envelope: ChartEnvelope = self.get_json(symbol, url, &query).await?;
        parse_chart_meta(symbol, envelope)
    }
}

#[async_trait]
impl QuoteSource for YahooClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, ApiError> {
        match self.fetch_quote_with_crumb(symbol).await {
            Err(ApiError::Unauthorized(reason)) => {
                tracing::warn!(
                    symbol,
                    %reason,
                    "Quote endpoint refused the session. Falling back to chart metadata."
                );
                // The next call starts a new session.
                self.forget_crumb().await;
                self.fetch_quote_from_chart(symbol).await
            }
            other => other,
        }
    }

    async fn fetch_history(&self, symbol: &str, days: u32) -> Result<Series, ApiError> {
        let url = self.endpoint(&["v8", "finance", "chart", symbol]);
        let query = [
            ("range", format!("{days}d")),
            ("interval", "1d".to_string()),
        ];
        let envelope: ChartEnvelope = self.get_json(symbol, url, &query).await?;
        parse_chart(symbol, envelope)
    }
}
