use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A quote record exactly as the upstream source returned it.
///
/// Upstream sources disagree on field names, so the record stays an untyped JSON
/// object until `analytics::normalize_quote` reconciles it. A key holding JSON
/// `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawQuote {
    fields: Map<String, Value>,
}

impl RawQuote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Returns the value stored under `key`, treating `null` as missing.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|value| !value.is_null())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Builder-style variant of [`RawQuote::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Value::is_null)
    }
}
