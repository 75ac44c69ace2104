use crate::error::DashboardError;
use analytics::{AnalyticsError, MetricsEngine, merge_latest_bar, normalize_quote};
use api_client::{QuoteSource, RetryPolicy, RetryingSource, YahooClient};
use chrono::Utc;
use configuration::Config;
use core_types::{Series, StockSnapshot, validate_symbol};
use std::sync::Arc;

pub mod display;
pub mod error;
pub mod queue;
pub mod state;

pub use queue::FetchQueue;
pub use state::{DashboardState, SymbolEntry};

/// The orchestrator behind both the web API and the CLI.
///
/// For each symbol it fetches the latest quote and the trailing daily history,
/// reconciles the quote, fills gaps from the latest bar and derives the metrics.
#[derive(Clone)]
pub struct Dashboard {
    source: Arc<dyn QuoteSource>,
    engine: MetricsEngine,
    queue: FetchQueue,
    history_days: u32,
}

impl Dashboard {
    /// Creates a dashboard over any quote source.
    pub fn new(source: Arc<dyn QuoteSource>, queue: FetchQueue, history_days: u32) -> Self {
        Self {
            source,
            engine: MetricsEngine::new(),
            queue,
            history_days,
        }
    }

    /// Wires up the live Yahoo client, wrapped in the configured retry policy.
    pub fn from_config(config: &Config) -> Result<Self, DashboardError> {
        let client = YahooClient::new(&config.quote_source)?;
        let policy = RetryPolicy::from_config(&config.retry, &config.quote_source);
        let source = Arc::new(RetryingSource::new(client, policy));

        Ok(Self::new(
            source,
            FetchQueue::new(config.dashboard.max_concurrent_requests),
            config.quote_source.history_days,
        ))
    }

    /// Loads everything the dashboard shows for one symbol.
    ///
    /// A failed quote fetch fails the symbol. A failed history fetch does not:
    /// the snapshot is returned with an empty series and no metrics.
    pub async fn load_symbol(&self, symbol: &str) -> Result<StockSnapshot, DashboardError> {
        let symbol = validate_symbol(symbol)?;

        let raw = self.source.fetch_quote(symbol).await?;

        let history = match self.source.fetch_history(symbol, self.history_days).await {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!(symbol, error = %e, "History unavailable, continuing without it.");
                Series::empty()
            }
        };

        let quote = merge_latest_bar(normalize_quote(symbol, &raw), &history);

        let metrics = match self.engine.compute_metrics(&history, quote.market_cap) {
            Ok(metrics) => Some(metrics),
            Err(AnalyticsError::EmptySeries) => None,
        };

        Ok(StockSnapshot {
            quote,
            historical_data: history,
            metrics,
        })
    }

    /// Loads every symbol through the fetch queue and returns a fresh state.
    pub async fn refresh<S: AsRef<str>>(&self, symbols: &[S]) -> DashboardState {
        self.refresh_with(symbols, |_, _| {}).await
    }

    /// Like [`Dashboard::refresh`], calling `on_loaded` as each symbol finishes.
    ///
    /// A failing symbol becomes a [`SymbolEntry::Failed`] marker and never
    /// aborts the batch.
    pub async fn refresh_with<S, F>(&self, symbols: &[S], on_loaded: F) -> DashboardState
    where
        S: AsRef<str>,
        F: Fn(&str, &SymbolEntry),
    {
        tracing::info!(
            symbols = symbols.len(),
            max_in_flight = self.queue.max_in_flight(),
            "Refreshing dashboard."
        );

        let symbols: Vec<String> = symbols
            .iter()
            .map(|s| AsRef::<str>::as_ref(s).trim().to_string())
            .collect();
        let on_loaded = &on_loaded;
        let entries = self
            .queue
            .run(symbols, |symbol| async move {
                let entry = match self.load_symbol(&symbol).await {
                    Ok(snapshot) => SymbolEntry::Loaded(snapshot),
                    Err(e) => {
                        tracing::error!(symbol = %symbol, error = %e, "Failed to load symbol.");
                        SymbolEntry::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                on_loaded(&symbol, &entry);
                (symbol, entry)
            })
            .await;

        let state = DashboardState::from_entries(entries, Utc::now());
        tracing::info!(
            loaded = state.loaded().count(),
            failed = state.failed().count(),
            "Dashboard refresh complete."
        );
        state
    }
}
