use crate::error::ApiError;
use chrono::DateTime;
use core_types::{Bar, RawQuote, Series};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.

/// The envelope returned by `GET /v7/finance/quote`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEnvelope {
    pub quote_response: QuoteResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteResponse {
    /// One loosely-typed record per requested symbol. Kept as a raw map so the
    /// reconciliation step can read whichever naming convention is present.
    #[serde(default)]
    pub result: Vec<Map<String, Value>>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

/// The envelope returned by `GET /v8/finance/chart/{symbol}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    /// Instrument metadata: the latest regular-market fields, the display names
    /// and `gmtoffset`, the exchange's offset from UTC in seconds.
    #[serde(default)]
    pub meta: Map<String, Value>,
    /// Seconds since the Unix epoch, one per row.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<ChartQuote>,
}

/// Column-oriented OHLCV arrays. Any entry may be `null` on days without trades.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartQuote {
    #[serde(default)]
    pub open: Vec<Option<Decimal>>,
    #[serde(default)]
    pub high: Vec<Option<Decimal>>,
    #[serde(default)]
    pub low: Vec<Option<Decimal>>,
    #[serde(default)]
    pub close: Vec<Option<Decimal>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

/// Represents an error object embedded in a response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ErrorBody {
    fn is_not_found(&self) -> bool {
        self.code.eq_ignore_ascii_case("Not Found")
    }

    fn into_error(self, symbol: &str) -> ApiError {
        if self.is_not_found() {
            return ApiError::NotFound(symbol.to_string());
        }
        let description = self.description.unwrap_or_default();
        ApiError::InvalidData(format!("{}: {}", self.code, description))
    }
}

/// Extracts the record for `symbol` from a quote response.
pub fn parse_quote(symbol: &str, envelope: QuoteEnvelope) -> Result<RawQuote, ApiError> {
    let QuoteResponse { result, error } = envelope.quote_response;
    if let Some(error) = error {
        return Err(error.into_error(symbol));
    }
    result
        .into_iter()
        .next()
        .map(RawQuote::from_map)
        .ok_or_else(|| ApiError::NotFound(symbol.to_string()))
}

fn first_chart(symbol: &str, envelope: ChartEnvelope) -> Result<ChartResult, ApiError> {
    let ChartResponse { result, error } = envelope.chart;
    if let Some(error) = error {
        return Err(error.into_error(symbol));
    }
    result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ApiError::NotFound(symbol.to_string()))
}

/// Extracts the quote record carried in a chart response's `meta` block.
pub fn parse_chart_meta(symbol: &str, envelope: ChartEnvelope) -> Result<RawQuote, ApiError> {
    let chart = first_chart(symbol, envelope)?;
    let raw = RawQuote::from_map(chart.meta);
    if raw.is_empty() {
        return Err(ApiError::NotFound(symbol.to_string()));
    }
    Ok(raw)
}

/// Turns a chart response into a daily [`Series`].
///
/// Rows where any of the five OHLCV values is missing are dropped. Dates are the
/// exchange-local calendar date of each row's timestamp, using `meta.gmtoffset`;
/// if two rows land on the same date the later one wins.
pub fn parse_chart(symbol: &str, envelope: ChartEnvelope) -> Result<Series, ApiError> {
    let chart = first_chart(symbol, envelope)?;
    let gmt_offset = chart.meta.get("gmtoffset").and_then(Value::as_i64).unwrap_or(0);

    let Some(columns) = chart.indicators.quote.into_iter().next() else {
        return Ok(Series::empty());
    };

    let mut bars = Vec::with_capacity(chart.timestamp.len());
    let mut skipped = 0usize;
    for (i, &timestamp) in chart.timestamp.iter().enumerate() {
        let date = timestamp
            .checked_add(gmt_offset)
            .and_then(|local| DateTime::from_timestamp(local, 0))
            .ok_or_else(|| ApiError::InvalidData(format!("Invalid timestamp: {timestamp}")))?
            .date_naive();

        let row = (
            cell(&columns.open, i),
            cell(&columns.high, i),
            cell(&columns.low, i),
            cell(&columns.close, i),
            cell(&columns.volume, i),
        );
        match row {
            (Some(open), Some(high), Some(low), Some(close), Some(volume)) => bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            }),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!(symbol, skipped, "Dropped incomplete chart rows.");
    }
    for bar in bars.iter().filter(|bar| !bar.is_consistent()) {
        tracing::debug!(symbol, date = %bar.date, "Chart bar has inconsistent OHLC values.");
    }

    Ok(Series::from_unordered(bars))
}

fn cell<T: Copy>(column: &[Option<T>], index: usize) -> Option<T> {
    column.get(index).copied().flatten()
}

/// Best-effort human readable message from a non-success response body.
pub(crate) fn error_message(body: &str) -> String {
    let described = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        ["chart", "quoteResponse", "finance"]
            .iter()
            .find_map(|root| value.get(root)?.get("error")?.get("description")?.as_str())
            .map(str::to_string)
    });
    described.unwrap_or_else(|| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart(value: Value) -> ChartEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn quote_takes_first_result() {
        let envelope: QuoteEnvelope = serde_json::from_value(json!({
            "quoteResponse": {
                "result": [{"symbol": "AAPL", "regularMarketPrice": 189.84, "marketCap": null}],
                "error": null
            }
        }))
        .unwrap();

        let raw = parse_quote("AAPL", envelope).unwrap();
        assert_eq!(raw.get("regularMarketPrice"), Some(&json!(189.84)));
        assert_eq!(raw.get("marketCap"), None);
    }

    #[test]
    fn empty_quote_result_is_not_found() {
        let envelope: QuoteEnvelope =
            serde_json::from_value(json!({"quoteResponse": {"result": []}})).unwrap();
        assert!(matches!(parse_quote("ZZZZ", envelope), Err(ApiError::NotFound(s)) if s == "ZZZZ"));
    }

    #[test]
    fn chart_rows_with_nulls_are_skipped() {
        let envelope = chart(json!({
            "chart": {
                "result": [{
                    "timestamp": [1704205800, 1704292200, 1704378600],
                    "indicators": {"quote": [{
                        "open":   [187.15, null, 182.15],
                        "high":   [188.44, 185.88, 183.09],
                        "low":    [183.89, 183.43, 180.88],
                        "close":  [185.64, 184.25, 181.91],
                        "volume": [82488700, 58414500, 71983600]
                    }]}
                }],
                "error": null
            }
        }));

        let series = parse_chart("AAPL", envelope).unwrap();

        assert_eq!(series.len(), 2);
        let dates: Vec<String> = series.iter().map(|b| b.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-02", "2024-01-04"]);
        assert_eq!(series.latest().unwrap().volume, 71_983_600);
    }

    #[test]
    fn chart_dates_use_the_exchange_offset() {
        // 23:00 UTC on 2024-01-01 is 10:00 on 2024-01-02 in Sydney (UTC+11).
        let envelope = chart(json!({
            "chart": {
                "result": [{
                    "meta": {"symbol": "BHP.AX", "gmtoffset": 39600},
                    "timestamp": [1704150000, 1704236400],
                    "indicators": {"quote": [{
                        "open":   [45.1, 45.6],
                        "high":   [45.9, 46.0],
                        "low":    [44.8, 45.2],
                        "close":  [45.5, 45.8],
                        "volume": [6100000, 5800000]
                    }]}
                }],
                "error": null
            }
        }));

        let series = parse_chart("BHP.AX", envelope).unwrap();

        let dates: Vec<String> = series.iter().map(|b| b.date.to_string()).collect();
        assert_eq!(dates, ["2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn inconsistent_bars_are_kept() {
        let envelope = chart(json!({
            "chart": {
                "result": [{
                    "timestamp": [1704205800],
                    "indicators": {"quote": [{
                        "open": [187.15], "high": [183.0], "low": [183.89],
                        "close": [185.64], "volume": [82488700]
                    }]}
                }]
            }
        }));

        let series = parse_chart("AAPL", envelope).unwrap();
        assert_eq!(series.len(), 1);
        assert!(!series.latest().unwrap().is_consistent());
    }

    #[test]
    fn chart_meta_becomes_a_quote_record() {
        let envelope = chart(json!({
            "chart": {
                "result": [{
                    "meta": {
                        "symbol": "AAPL",
                        "longName": "Apple Inc.",
                        "regularMarketPrice": 189.84,
                        "chartPreviousClose": 192.53,
                        "regularMarketDayHigh": 191.05,
                        "regularMarketDayLow": 188.19,
                        "regularMarketVolume": 52164500,
                        "gmtoffset": -18000
                    },
                    "timestamp": [1704205800],
                    "indicators": {"quote": [{}]}
                }],
                "error": null
            }
        }));

        let raw = parse_chart_meta("AAPL", envelope).unwrap();
        assert_eq!(raw.get("regularMarketPrice"), Some(&json!(189.84)));
        assert_eq!(raw.get("chartPreviousClose"), Some(&json!(192.53)));
        assert_eq!(raw.get("longName"), Some(&json!("Apple Inc.")));
    }

    #[test]
    fn chart_without_meta_has_no_quote() {
        let envelope = chart(json!({
            "chart": {"result": [{"timestamp": [], "indicators": {"quote": []}}], "error": null}
        }));
        assert!(matches!(parse_chart_meta("AAPL", envelope), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn chart_without_quote_columns_is_empty() {
        let envelope = chart(json!({
            "chart": {"result": [{"timestamp": [], "indicators": {"quote": []}}], "error": null}
        }));
        assert!(parse_chart("AAPL", envelope).unwrap().is_empty());
    }

    #[test]
    fn chart_not_found_error_maps_to_not_found() {
        let envelope = chart(json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        }));
        assert!(matches!(parse_chart("ZZZZ", envelope), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn other_chart_errors_are_invalid_data() {
        let envelope = chart(json!({
            "chart": {"result": null, "error": {"code": "Bad Request", "description": "Invalid range"}}
        }));
        let err = parse_chart("AAPL", envelope).unwrap_err();
        assert!(matches!(err, ApiError::InvalidData(ref m) if m.contains("Invalid range")));
        assert!(!err.is_transient());
    }

    #[test]
    fn error_message_prefers_embedded_description() {
        let body = r#"{"finance":{"error":{"code":"Unauthorized","description":"Invalid Crumb"}}}"#;
        assert_eq!(error_message(body), "Invalid Crumb");
        assert_eq!(error_message("plain text"), "plain text");
    }
}
