use analytics::{merge_latest_bar, normalize_quote, MetricsEngine};
use chrono::NaiveDate;
use core_types::{Bar, DerivedMetrics, RawQuote, Series};
use rust_decimal_macros::dec;

fn two_day_series() -> Series {
    Series::new(vec![
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            open: dec!(10),
            high: dec!(12),
            low: dec!(9),
            close: dec!(11),
            volume: 1000,
        },
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: dec!(11),
            high: dec!(13),
            low: dec!(10),
            close: dec!(12),
            volume: 2000,
        },
    ])
    .unwrap()
}

#[test]
fn two_day_series_produces_expected_metrics() {
    let metrics = MetricsEngine::new()
        .compute_metrics(&two_day_series(), Some(dec!(5000000000)))
        .unwrap();

    assert_eq!(
        metrics,
        DerivedMetrics {
            lowest_volume: 1000,
            highest_volume: 2000,
            lowest_close: dec!(11),
            highest_close: dec!(12),
            average_volume: 1500,
            current_market_cap: Some(dec!(5000000000)),
        }
    );
}

#[test]
fn metrics_serialize_with_camel_case_keys() {
    let metrics = MetricsEngine::new()
        .compute_metrics(&two_day_series(), None)
        .unwrap();
    let value = serde_json::to_value(&metrics).unwrap();

    assert_eq!(value["averageVolume"], 1500);
    assert_eq!(value["lowestVolume"], 1000);
    assert!(value.get("currentMarketCap").is_none());
}

#[test]
fn normalized_quote_feeds_market_cap_into_metrics() {
    let series = two_day_series();
    let raw = RawQuote::new()
        .with("regularMarketPrice", 12.4)
        .with("marketCap", 5_000_000_000u64);

    let quote = merge_latest_bar(normalize_quote("AAPL", &raw), &series);
    let metrics = MetricsEngine::new()
        .compute_metrics(&series, quote.market_cap)
        .unwrap();

    assert_eq!(quote.current_value, Some(dec!(12.4)));
    assert_eq!(quote.close, Some(dec!(12)));
    assert_eq!(metrics.current_market_cap, Some(dec!(5000000000)));
}
