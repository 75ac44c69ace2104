use crate::error::CoreError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data for a single symbol.
///
/// Prices share one currency unit. The `low <= open, close <= high` relation is
/// expected from the data source but is not enforced here; see [`Bar::is_consistent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl Bar {
    /// Returns `true` when the bar's prices respect `low <= open, close <= high`.
    /// Bars failing this check are unusual but still valid input.
    pub fn is_consistent(&self) -> bool {
        self.low <= self.high
            && self.low <= self.open
            && self.open <= self.high
            && self.low <= self.close
            && self.close <= self.high
    }
}

/// An ordered run of daily bars for one symbol, oldest first, one bar per date.
///
/// Serialized as a plain JSON array. An empty series is legal and means the
/// symbol has no historical data yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bar>", into = "Vec<Bar>")]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    /// Builds a series, rejecting bars that are not strictly ascending by date.
    pub fn new(bars: Vec<Bar>) -> Result<Self, CoreError> {
        if let Some(pair) = bars.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(CoreError::InvalidInput(
                "series".to_string(),
                format!(
                    "bars must be strictly ascending by date, found {} followed by {}",
                    pair[0].date, pair[1].date
                ),
            ));
        }
        Ok(Self { bars })
    }

    /// Builds a series from bars in any order. Bars are sorted by date and, when a
    /// date appears more than once, the bar that came last in the input wins.
    pub fn from_unordered(bars: Vec<Bar>) -> Self {
        let mut bars = bars;
        // Stable sort keeps input order among equal dates, so the last one is the newest.
        bars.sort_by_key(|bar| bar.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self { bars: deduped }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The most recent bar, if any.
    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}

impl TryFrom<Vec<Bar>> for Series {
    type Error = CoreError;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Series::new(bars)
    }
}

impl From<Series> for Vec<Bar> {
    fn from(series: Series) -> Self {
        series.bars
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}

/// The latest-known snapshot for one symbol.
///
/// Every field except `symbol` is optional because the upstream source may only
/// supply part of the record. An absent field is omitted from JSON output; it is
/// never turned into a zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    /// Company or instrument display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Latest traded price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<Decimal>,
    /// Signed change versus the previous close, in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_change: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<Decimal>,
    /// Close of the most recent completed session. Not the same as `current_value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<Decimal>,
}

impl Quote {
    /// A quote carrying only its symbol, i.e. "no data for this symbol".
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Returns `false` when every field other than `symbol` is absent.
    pub fn has_data(&self) -> bool {
        self.name.is_some()
            || self.current_value.is_some()
            || self.percentage_change.is_some()
            || self.previous_close.is_some()
            || self.volume.is_some()
            || self.market_cap.is_some()
            || self.high.is_some()
            || self.low.is_some()
            || self.open.is_some()
            || self.close.is_some()
    }
}

/// Summary statistics over a non-empty [`Series`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub lowest_volume: u64,
    pub highest_volume: u64,
    pub lowest_close: Decimal,
    pub highest_close: Decimal,
    /// Mean volume, rounded half-up to the nearest share.
    pub average_volume: u64,
    /// Passed through from the quote's market cap; not derived from the series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_market_cap: Option<Decimal>,
}

/// Everything the dashboard renders for one symbol: the quote fields at the top
/// level, the historical series and, when the series is non-empty, its metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    #[serde(flatten)]
    pub quote: Quote,
    #[serde(default)]
    pub historical_data: Series,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<DerivedMetrics>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(date: &str, close: Decimal, volume: u64) -> Bar {
        Bar {
            date: date.parse().unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    #[test]
    fn series_rejects_out_of_order_and_duplicate_dates() {
        let out_of_order = vec![bar("2024-01-02", dec!(1), 1), bar("2024-01-01", dec!(1), 1)];
        assert!(Series::new(out_of_order).is_err());

        let duplicated = vec![bar("2024-01-01", dec!(1), 1), bar("2024-01-01", dec!(2), 1)];
        assert!(Series::new(duplicated).is_err());

        let ok = vec![bar("2024-01-01", dec!(1), 1), bar("2024-01-02", dec!(2), 1)];
        assert_eq!(Series::new(ok).unwrap().len(), 2);
    }

    #[test]
    fn from_unordered_sorts_and_keeps_last_duplicate() {
        let series = Series::from_unordered(vec![
            bar("2024-01-03", dec!(3), 30),
            bar("2024-01-01", dec!(1), 10),
            bar("2024-01-03", dec!(4), 40),
        ]);

        let dates: Vec<String> = series.iter().map(|b| b.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-01", "2024-01-03"]);
        assert_eq!(series.latest().unwrap().close, dec!(4));
    }

    #[test]
    fn inconsistent_bar_is_detected_but_allowed() {
        let mut odd = bar("2024-01-01", dec!(10), 5);
        odd.low = dec!(12);
        assert!(!odd.is_consistent());
        assert!(Series::new(vec![odd]).is_ok());
    }

    #[test]
    fn series_deserialization_enforces_ordering() {
        let json = r#"[
            {"date":"2024-01-02","open":1,"high":1,"low":1,"close":1,"volume":1},
            {"date":"2024-01-01","open":1,"high":1,"low":1,"close":1,"volume":1}
        ]"#;
        assert!(serde_json::from_str::<Series>(json).is_err());
    }

    #[test]
    fn absent_quote_fields_are_omitted_from_json() {
        let mut quote = Quote::empty("AAPL");
        assert!(!quote.has_data());

        quote.current_value = Some(dec!(150));
        let value = serde_json::to_value(&quote).unwrap();
        let object = value.as_object().unwrap();

        assert!(quote.has_data());
        assert_eq!(object.len(), 2);
        assert_eq!(object["symbol"], "AAPL");
        assert!(object.contains_key("currentValue"));
        assert!(!object.contains_key("marketCap"));
        assert!(!object.contains_key("name"));
    }

    #[test]
    fn name_alone_counts_as_data() {
        let mut quote = Quote::empty("AAPL");
        quote.name = Some("Apple Inc.".to_string());

        assert!(quote.has_data());
        assert_eq!(serde_json::to_value(&quote).unwrap()["name"], "Apple Inc.");
    }

    #[test]
    fn snapshot_flattens_quote_and_omits_missing_metrics() {
        let snapshot = StockSnapshot {
            quote: Quote::empty("MSFT"),
            historical_data: Series::empty(),
            metrics: None,
        };
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["symbol"], "MSFT");
        assert_eq!(value["historicalData"], serde_json::json!([]));
        assert!(value.get("metrics").is_none());
    }
}
