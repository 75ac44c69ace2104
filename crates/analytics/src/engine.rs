use crate::error::AnalyticsError;
use core_types::{DerivedMetrics, Series};
use rust_decimal::Decimal;

/// A stateless calculator for deriving summary metrics from a daily series.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsEngine {}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point for calculating derived metrics.
    ///
    /// # Arguments
    ///
    /// * `series` - The trailing window of daily bars for one symbol.
    /// * `market_cap` - The quote's current market cap, passed through untouched.
    ///
    /// # Returns
    ///
    /// The `DerivedMetrics`, or `AnalyticsError::EmptySeries` when the series has
    /// no bars. Extrema and averages over zero bars are undefined, so no default
    /// values are substituted.
    pub fn compute_metrics(
        &self,
        series: &Series,
        market_cap: Option<Decimal>,
    ) -> Result<DerivedMetrics, AnalyticsError> {
        let mut bars = series.iter();
        let first = bars.next().ok_or(AnalyticsError::EmptySeries)?;

        let mut lowest_volume = first.volume;
        let mut highest_volume = first.volume;
        let mut lowest_close = first.close;
        let mut highest_close = first.close;
        let mut volume_sum = u128::from(first.volume);

        for bar in bars {
            lowest_volume = lowest_volume.min(bar.volume);
            highest_volume = highest_volume.max(bar.volume);
            lowest_close = lowest_close.min(bar.close);
            highest_close = highest_close.max(bar.close);
            volume_sum += u128::from(bar.volume);
        }

        Ok(DerivedMetrics {
            lowest_volume,
            highest_volume,
            lowest_close,
            highest_close,
            average_volume: round_half_up_mean(volume_sum, series.len()),
            current_market_cap: market_cap,
        })
    }
}

/// Exact `round(sum / count)` with halves rounded up, in integer arithmetic.
///
/// `count` must be non-zero. The mean never exceeds the largest volume, so the
/// result always fits back into a `u64`.
fn round_half_up_mean(sum: u128, count: usize) -> u64 {
    let count = count as u128;
    let rounded = (2 * sum + count) / (2 * count);
    u64::try_from(rounded).unwrap_or(u64::MAX)
}
