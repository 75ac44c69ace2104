//! Reconciliation of upstream quote records into a single [`Quote`] shape.
//!
//! Upstream sources use two naming conventions for the same facts: the
//! "ticker info" convention (`currentPrice`, `dayHigh`, ...) and the intraday
//! "regular market" convention (`regularMarketPrice`, `regularMarketDayHigh`, ...).
//! Each target field owns an ordered list of candidate keys and the first
//! candidate that is present wins. Supporting another convention means adding
//! keys to [`RECONCILIATION_TABLE`].

use core_types::{Quote, RawQuote, Series};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Number, Value};
use std::str::FromStr;

/// A field of [`Quote`] that can be filled from an upstream record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteField {
    Name,
    CurrentValue,
    PercentageChange,
    PreviousClose,
    Volume,
    MarketCap,
    High,
    Low,
    Open,
    Close,
}

/// Ordered candidate upstream keys for one target field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub target: QuoteField,
    pub candidates: &'static [&'static str],
}

/// The default reconciliation table. The more specific key comes first.
///
/// `Close` has no price candidates: `current_value` is the latest
/// traded price, and `close` is only ever a session close.
pub const RECONCILIATION_TABLE: &[FieldRule] = &[
    FieldRule {
        target: QuoteField::Name,
        candidates: &["longName", "shortName"],
    },
    FieldRule {
        target: QuoteField::CurrentValue,
        candidates: &["currentPrice", "regularMarketPrice"],
    },
    FieldRule {
        target: QuoteField::PercentageChange,
        candidates: &["regularMarketChangePercent"],
    },
    FieldRule {
        target: QuoteField::PreviousClose,
        candidates: &["previousClose", "regularMarketPreviousClose", "chartPreviousClose"],
    },
    FieldRule {
        target: QuoteField::Volume,
        candidates: &["volume", "regularMarketVolume"],
    },
    FieldRule {
        target: QuoteField::MarketCap,
        candidates: &["marketCap"],
    },
    FieldRule {
        target: QuoteField::High,
        candidates: &["dayHigh", "regularMarketDayHigh"],
    },
    FieldRule {
        target: QuoteField::Low,
        candidates: &["dayLow", "regularMarketDayLow"],
    },
    FieldRule {
        target: QuoteField::Open,
        candidates: &["open", "regularMarketOpen"],
    },
    FieldRule {
        target: QuoteField::Close,
        candidates: &["close"],
    },
];

/// Normalizes `raw` with the default [`RECONCILIATION_TABLE`].
///
/// Never fails: fields that no candidate can supply are left absent.
pub fn normalize_quote(symbol: &str, raw: &RawQuote) -> Quote {
    normalize_quote_with(RECONCILIATION_TABLE, symbol, raw)
}

/// Normalizes `raw` using an explicit reconciliation table.
pub fn normalize_quote_with(table: &[FieldRule], symbol: &str, raw: &RawQuote) -> Quote {
    let mut quote = Quote::empty(symbol);

    for rule in table {
        match rule.target {
            QuoteField::Name => quote.name = first_present(raw, rule.candidates, text_from),
            QuoteField::Volume => quote.volume = first_present(raw, rule.candidates, volume_from),
            _ => {
                if let Some(slot) = decimal_slot(&mut quote, rule.target) {
                    *slot = first_present(raw, rule.candidates, decimal_from);
                }
            }
        }
    }

    quote
}

/// Fills absent `open`, `high`, `low`, `close` and `volume` from the most recent
/// bar of `series`. Fields the quote already carries are left alone.
pub fn merge_latest_bar(quote: Quote, series: &Series) -> Quote {
    let Some(latest) = series.latest() else {
        return quote;
    };

    Quote {
        open: quote.open.or(Some(latest.open)),
        high: quote.high.or(Some(latest.high)),
        low: quote.low.or(Some(latest.low)),
        close: quote.close.or(Some(latest.close)),
        volume: quote.volume.or(Some(latest.volume)),
        ..quote
    }
}

/// The decimal-valued slot for `field`; `None` for the name and volume fields.
fn decimal_slot(quote: &mut Quote, field: QuoteField) -> Option<&mut Option<Decimal>> {
    let slot = match field {
        QuoteField::CurrentValue => &mut quote.current_value,
        QuoteField::PercentageChange => &mut quote.percentage_change,
        QuoteField::PreviousClose => &mut quote.previous_close,
        QuoteField::MarketCap => &mut quote.market_cap,
        QuoteField::High => &mut quote.high,
        QuoteField::Low => &mut quote.low,
        QuoteField::Open => &mut quote.open,
        QuoteField::Close => &mut quote.close,
        QuoteField::Name | QuoteField::Volume => return None,
    };
    Some(slot)
}

/// Tries each candidate key in order and returns the first value `convert` accepts.
fn first_present<T>(
    raw: &RawQuote,
    candidates: &[&str],
    convert: fn(&Value) -> Option<T>,
) -> Option<T> {
    candidates.iter().find_map(|key| {
        let value = raw.get(key)?;
        let converted = convert(value);
        if converted.is_none() {
            tracing::debug!(field = *key, value = %value, "Ignoring unusable upstream quote field.");
        }
        converted
    })
}

fn decimal_from(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => decimal_from_number(number),
        _ => None,
    }
}

fn decimal_from_number(number: &Number) -> Option<Decimal> {
    if let Some(i) = number.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = number.as_u64() {
        return Some(Decimal::from(u));
    }
    // Going through the JSON text keeps e.g. 151.23 exact instead of its binary approximation.
    let text = number.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// A non-blank string, trimmed.
fn text_from(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn volume_from(value: &Value) -> Option<u64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(u) = number.as_u64() {
        return Some(u);
    }
    // Some feeds send volumes as floats such as 52164500.0.
    let decimal = decimal_from_number(number)?;
    if decimal.is_sign_negative() || !decimal.fract().is_zero() {
        return None;
    }
    decimal.to_u64()
}
