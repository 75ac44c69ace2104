use chrono::{DateTime, Utc};
use core_types::StockSnapshot;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The outcome of loading one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SymbolEntry {
    Loaded(StockSnapshot),
    /// The symbol could not be loaded. Other symbols are unaffected.
    Failed { reason: String },
}

impl SymbolEntry {
    pub fn snapshot(&self) -> Option<&StockSnapshot> {
        match self {
            SymbolEntry::Loaded(snapshot) => Some(snapshot),
            SymbolEntry::Failed { .. } => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, SymbolEntry::Loaded(_))
    }
}

/// Per-symbol dashboard data, keyed by symbol in display order.
///
/// A state is produced whole by a refresh and replaces the previous one
/// wholesale; entries are never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refreshed_at: Option<DateTime<Utc>>,
    symbols: IndexMap<String, SymbolEntry>,
}

impl DashboardState {
    /// An empty state that has never been refreshed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from entries in display order. A repeated symbol keeps
    /// its first position and its last entry.
    pub fn from_entries<I>(entries: I, refreshed_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = (String, SymbolEntry)>,
    {
        Self {
            refreshed_at: Some(refreshed_at),
            symbols: entries.into_iter().collect(),
        }
    }

    /// Swaps in the result of a newer refresh.
    pub fn replace_with(&mut self, newer: DashboardState) {
        *self = newer;
    }

    /// `false` until the first refresh has completed.
    pub fn is_populated(&self) -> bool {
        self.refreshed_at.is_some()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolEntry> {
        self.symbols.get(symbol)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &SymbolEntry)> {
        self.symbols.iter().map(|(symbol, entry)| (symbol.as_str(), entry))
    }

    pub fn loaded(&self) -> impl Iterator<Item = &StockSnapshot> {
        self.symbols.values().filter_map(SymbolEntry::snapshot)
    }

    /// `(symbol, reason)` for every symbol that failed to load.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.symbols.iter().filter_map(|(symbol, entry)| match entry {
            SymbolEntry::Failed { reason } => Some((symbol.as_str(), reason.as_str())),
            SymbolEntry::Loaded(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{Quote, Series};

    fn loaded(symbol: &str) -> (String, SymbolEntry) {
        (
            symbol.to_string(),
            SymbolEntry::Loaded(StockSnapshot {
                quote: Quote::empty(symbol),
                historical_data: Series::empty(),
                metrics: None,
            }),
        )
    }

    fn failed(symbol: &str, reason: &str) -> (String, SymbolEntry) {
        (
            symbol.to_string(),
            SymbolEntry::Failed {
                reason: reason.to_string(),
            },
        )
    }

    #[test]
    fn entries_keep_display_order() {
        let state = DashboardState::from_entries(
            vec![loaded("MSFT"), failed("ZZZZ", "not found"), loaded("AAPL")],
            Utc::now(),
        );

        let order: Vec<&str> = state.entries().map(|(s, _)| s).collect();
        assert_eq!(order, ["MSFT", "ZZZZ", "AAPL"]);
        assert_eq!(state.loaded().count(), 2);
        assert_eq!(state.failed().collect::<Vec<_>>(), [("ZZZZ", "not found")]);
        assert!(state.get("AAPL").unwrap().is_loaded());
        assert!(state.get("GOOGL").is_none());
    }

    #[test]
    fn replace_with_discards_previous_entries() {
        let mut state = DashboardState::new();
        assert!(!state.is_populated());
        assert!(state.is_empty());

        state.replace_with(DashboardState::from_entries(
            vec![loaded("AAPL"), loaded("MSFT")],
            Utc::now(),
        ));
        state.replace_with(DashboardState::from_entries(vec![loaded("META")], Utc::now()));

        assert!(state.is_populated());
        assert_eq!(state.len(), 1);
        assert!(state.get("AAPL").is_none());
    }

    #[test]
    fn json_shape_tags_each_entry() {
        let state = DashboardState::from_entries(
            vec![loaded("AAPL"), failed("ZZZZ", "not found")],
            Utc::now(),
        );
        let value = serde_json::to_value(&state).unwrap();

        assert!(value["refreshedAt"].is_string());
        assert_eq!(value["symbols"]["AAPL"]["status"], "loaded");
        assert_eq!(value["symbols"]["AAPL"]["symbol"], "AAPL");
        assert_eq!(value["symbols"]["ZZZZ"]["status"], "failed");
        assert_eq!(value["symbols"]["ZZZZ"]["reason"], "not found");

        let never_refreshed = serde_json::to_value(DashboardState::new()).unwrap();
        assert!(never_refreshed.get("refreshedAt").is_none());
    }
}
