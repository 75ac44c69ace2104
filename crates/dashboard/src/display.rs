//! Terminal rendering of dashboard data.

use crate::state::{DashboardState, SymbolEntry};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use core_types::StockSnapshot;
use rust_decimal::{Decimal, RoundingStrategy};

const NOT_AVAILABLE: &str = "N/A";
const NO_DATA: &str = "no data available";

/// Magnitude suffixes in ascending order.
const SCALES: [(u64, &str); 3] = [
    (1_000_000, "M"),
    (1_000_000_000, "B"),
    (1_000_000_000_000, "T"),
];

/// Half-up rounding for display; the default strategy rounds half to even.
fn round_for_display(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats large values with a magnitude suffix (`1.23T`, `4.50B`, `12.00M`).
/// Values below one million are printed as whole numbers with thousands separators.
///
/// The scale is chosen after rounding, so `999999.5` prints as `1.00M`.
pub fn format_compact(value: Decimal) -> String {
    let magnitude = value.abs();
    let whole = round_for_display(magnitude, 0);

    let Some(mut index) = SCALES
        .iter()
        .rposition(|(scale, _)| whole >= Decimal::from(*scale))
    else {
        let sign = if value.is_sign_negative() && !whole.is_zero() { "-" } else { "" };
        return format!("{sign}{}", with_thousands_separators(&whole.to_string()));
    };

    let mut scaled = round_for_display(magnitude / Decimal::from(SCALES[index].0), 2);
    if scaled >= Decimal::ONE_THOUSAND && index + 1 < SCALES.len() {
        index += 1;
        scaled = round_for_display(magnitude / Decimal::from(SCALES[index].0), 2);
    }
    let sign = if value.is_sign_negative() { "-" } else { "" };
    format!("{sign}{scaled:.2}{}", SCALES[index].1)
}

pub fn format_volume(volume: Option<u64>) -> String {
    volume
        .map(|v| format_compact(Decimal::from(v)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn format_market_cap(market_cap: Option<Decimal>) -> String {
    market_cap
        .map(|m| format!("${}", format_compact(m)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// `$189.84`, or `N/A` when absent.
pub fn format_price(price: Option<Decimal>) -> String {
    price
        .map(|p| format!("${:.2}", round_for_display(p, 2)))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Signed percentage such as `+1.25%`. The sign follows the rounded value,
/// so `-0.001` prints as `+0.00%`.
pub fn format_percent(change: Option<Decimal>) -> String {
    match change.map(|c| round_for_display(c, 2)) {
        Some(c) if c < Decimal::ZERO => format!("-{:.2}%", c.abs()),
        Some(c) => format!("+{:.2}%", c.abs()),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn with_thousands_separators(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn change_cell(change: Option<Decimal>) -> Cell {
    let cell = Cell::new(format_percent(change)).set_alignment(CellAlignment::Right);
    match change.map(|c| round_for_display(c, 2)) {
        Some(c) if c < Decimal::ZERO => cell.fg(Color::Red),
        Some(_) => cell.fg(Color::Green),
        None => cell,
    }
}

fn right(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn text_cell(text: Option<&str>) -> Cell {
    Cell::new(text.unwrap_or(NOT_AVAILABLE))
}

/// One row per symbol: name, price, change, volume, market cap, or the
/// reason there is nothing to show.
pub fn summary_table(state: &DashboardState) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Symbol", "Name", "Price", "Change", "Volume", "Market Cap"]);

    for (symbol, entry) in state.entries() {
        match entry {
            SymbolEntry::Loaded(snapshot) if !snapshot.quote.has_data() => {
                table.add_row(vec![
                    Cell::new(symbol),
                    Cell::new(NO_DATA).fg(Color::DarkGrey),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(""),
                ]);
            }
            SymbolEntry::Loaded(snapshot) => {
                let quote = &snapshot.quote;
                table.add_row(vec![
                    Cell::new(symbol),
                    text_cell(quote.name.as_deref()),
                    right(format_price(quote.current_value)),
                    change_cell(quote.percentage_change),
                    right(format_volume(quote.volume)),
                    right(format_market_cap(quote.market_cap)),
                ]);
            }
            SymbolEntry::Failed { reason } => {
                table.add_row(vec![
                    Cell::new(symbol),
                    Cell::new(format!("unavailable: {reason}")).fg(Color::Red),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(""),
                ]);
            }
        }
    }

    table
}

/// The day's quote fields and the derived metrics for one symbol.
pub fn metrics_table(snapshot: &StockSnapshot) -> Table {
    let quote = &snapshot.quote;
    let mut table = new_table();
    table.set_header(vec![quote.symbol.as_str(), "Value"]);

    if !quote.has_data() && snapshot.metrics.is_none() {
        table.add_row(vec![Cell::new("Quote"), right(NO_DATA.to_string())]);
        return table;
    }

    let mut rows = vec![
        ("Name", quote.name.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string())),
        ("Open", format_price(quote.open)),
        ("High", format_price(quote.high)),
        ("Low", format_price(quote.low)),
        ("Close", format_price(quote.close)),
        ("Previous Close", format_price(quote.previous_close)),
    ];

    match &snapshot.metrics {
        Some(metrics) => rows.extend([
            ("Lowest Close", format_price(Some(metrics.lowest_close))),
            ("Highest Close", format_price(Some(metrics.highest_close))),
            ("Lowest Volume", format_volume(Some(metrics.lowest_volume))),
            ("Highest Volume", format_volume(Some(metrics.highest_volume))),
            ("Average Volume", format_volume(Some(metrics.average_volume))),
            ("Market Cap", format_market_cap(metrics.current_market_cap)),
        ]),
        None => rows.push(("Metrics", "no historical data".to_string())),
    }

    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), right(value)]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::{Quote, Series};
    use rust_decimal_macros::dec;

    #[test]
    fn compact_formatting_uses_magnitude_suffixes() {
        assert_eq!(format_compact(dec!(2950000000000)), "2.95T");
        assert_eq!(format_compact(dec!(1234567890)), "1.23B");
        assert_eq!(format_compact(dec!(4500000)), "4.50M");
        assert_eq!(format_compact(dec!(999999)), "999,999");
        assert_eq!(format_compact(dec!(1000)), "1,000");
        assert_eq!(format_compact(dec!(999)), "999");
        assert_eq!(format_compact(dec!(0)), "0");
        assert_eq!(format_compact(dec!(-2500000)), "-2.50M");
    }

    #[test]
    fn absent_values_render_as_not_available() {
        assert_eq!(format_price(None), "N/A");
        assert_eq!(format_volume(None), "N/A");
        assert_eq!(format_market_cap(None), "N/A");
        assert_eq!(format_percent(None), "N/A");
    }

    #[test]
    fn prices_and_percentages_have_two_decimals() {
        assert_eq!(format_price(Some(dec!(189.8))), "$189.80");
        assert_eq!(format_price(Some(dec!(11))), "$11.00");
        assert_eq!(format_percent(Some(dec!(1.254))), "+1.25%");
        assert_eq!(format_percent(Some(dec!(-0.5))), "-0.50%");
        assert_eq!(format_market_cap(Some(dec!(5000000000))), "$5.00B");
        assert_eq!(format_price(Some(dec!(0.125))), "$0.13");
    }

    #[test]
    fn percent_sign_follows_the_rounded_value() {
        assert_eq!(format_percent(Some(dec!(-0.001))), "+0.00%");
        assert_eq!(format_percent(Some(dec!(-0.005))), "-0.01%");
        assert_eq!(format_percent(Some(dec!(0.004))), "+0.00%");
        assert_eq!(format_percent(Some(dec!(-0))), "+0.00%");
    }

    #[test]
    fn compact_scale_is_chosen_after_rounding() {
        assert_eq!(format_compact(dec!(999999.5)), "1.00M");
        assert_eq!(format_compact(dec!(999999.4)), "999,999");
        assert_eq!(format_compact(dec!(999995000)), "1.00B");
        assert_eq!(format_compact(dec!(999994999)), "999.99M");
        assert_eq!(format_compact(dec!(-0.4)), "0");
        assert_eq!(format_compact(dec!(-999999.5)), "-1.00M");
    }

    fn render(mut table: Table) -> String {
        table.set_content_arrangement(ContentArrangement::Disabled);
        table.to_string()
    }

    fn loaded(quote: Quote) -> DashboardState {
        let symbol = quote.symbol.clone();
        DashboardState::from_entries(
            vec![(
                symbol,
                SymbolEntry::Loaded(StockSnapshot {
                    quote,
                    historical_data: Series::empty(),
                    metrics: None,
                }),
            )],
            Utc::now(),
        )
    }

    #[test]
    fn quote_without_data_renders_a_no_data_row() {
        let state = loaded(Quote::empty("AAPL"));
        let rendered = render(summary_table(&state));

        assert!(rendered.contains("AAPL"));
        assert!(rendered.contains("no data available"));
        assert!(!rendered.contains("N/A"));

        let snapshot = state.loaded().next().unwrap();
        assert!(render(metrics_table(snapshot)).contains("no data available"));
    }

    #[test]
    fn summary_shows_the_company_name() {
        let mut quote = Quote::empty("AAPL");
        quote.name = Some("Apple Inc.".to_string());
        quote.current_value = Some(dec!(189.84));
        let rendered = render(summary_table(&loaded(quote)));

        assert!(rendered.contains("Name"));
        assert!(rendered.contains("Apple Inc."));
        assert!(rendered.contains("$189.84"));
        assert!(!rendered.contains("no data available"));
    }
}
