// ── Response transforms ──
//
// Converts raw API payloads into the `{rows, sidebar}` shape the state
// store holds. Endpoints name a registered transform; without one the
// envelope-unwrapping fallback applies.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

/// A transform received a payload shape it cannot parse.
///
/// Always terminal: never retried, surfaced as the state's `error` field.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransformError {
    pub message: String,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Transformed payload: the row list plus optional endpoint-level summary
/// fields (the "sidebar data").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutcome {
    pub rows: Vec<Value>,
    pub sidebar: Option<Value>,
}

/// A pure payload transformation, registered by name.
pub trait DataTransform: Send + Sync {
    fn apply(&self, raw: &Value) -> Result<TransformOutcome, TransformError>;
}

// ── Envelope unwrapping fallback ─────────────────────────────────────

const ENVELOPE_KEYS: &[&str] = &["data", "items", "results"];

/// Heuristic extraction of a row list when no transform is configured.
///
/// Unwraps one level of a common `{data|items|results}` envelope. Arrays
/// become the row list; a bare object becomes a single row; `null` yields
/// no rows.
pub fn unwrap_envelope(raw: &Value) -> TransformOutcome {
    let inner = match raw {
        Value::Object(map) => ENVELOPE_KEYS
            .iter()
            .find_map(|key| map.get(*key))
            .unwrap_or(raw),
        other => other,
    };

    match inner {
        Value::Array(rows) => TransformOutcome {
            rows: rows.clone(),
            sidebar: None,
        },
        Value::Null => TransformOutcome::default(),
        single => TransformOutcome {
            rows: vec![single.clone()],
            sidebar: None,
        },
    }
}

// ── Built-in transforms ──────────────────────────────────────────────

/// Flattens an object-of-objects into rows, injecting each key as a field.
///
/// Exchange ticker feeds commonly return `{"result": {"BTC-USD": {...},
/// "ETH-USD": {...}}}`; each inner object becomes one row tagged with its
/// key under `key_field`.
pub struct KeyedRows {
    pub key_field: String,
}

impl Default for KeyedRows {
    fn default() -> Self {
        Self {
            key_field: "symbol".into(),
        }
    }
}

impl DataTransform for KeyedRows {
    fn apply(&self, raw: &Value) -> Result<TransformOutcome, TransformError> {
        let unwrapped = unwrap_one_level(raw);
        let Value::Object(map) = unwrapped else {
            return Err(TransformError::new("expected a keyed object payload"));
        };

        let mut rows = Vec::with_capacity(map.len());
        for (key, value) in map {
            let mut row = match value {
                Value::Object(fields) => fields.clone(),
                other => {
                    let mut fields = Map::new();
                    fields.insert("value".into(), other.clone());
                    fields
                }
            };
            row.insert(self.key_field.clone(), Value::String(key.clone()));
            rows.push(Value::Object(row));
        }

        Ok(TransformOutcome {
            rows,
            sidebar: None,
        })
    }
}

/// Splits an object payload into scalar summary fields (sidebar) and the
/// first array-valued field (rows).
///
/// Fits account-overview shapes: `{"equity": "1200.50", "currency": "USD",
/// "balances": [...]}`.
#[derive(Default)]
pub struct SummarySplit;

impl DataTransform for SummarySplit {
    fn apply(&self, raw: &Value) -> Result<TransformOutcome, TransformError> {
        let unwrapped = unwrap_one_level(raw);
        let Value::Object(map) = unwrapped else {
            return Err(TransformError::new("expected an object payload"));
        };

        let mut sidebar = Map::new();
        let mut rows = Vec::new();
        let mut rows_taken = false;

        for (key, value) in map {
            match value {
                Value::Array(list) if !rows_taken => {
                    rows = list.clone();
                    rows_taken = true;
                }
                other => {
                    sidebar.insert(key.clone(), other.clone());
                }
            }
        }

        Ok(TransformOutcome {
            rows,
            sidebar: if sidebar.is_empty() {
                None
            } else {
                Some(Value::Object(sidebar))
            },
        })
    }
}

/// Unwrap a single envelope level (including the `result` wrapper some
/// exchanges use), or return the value itself.
fn unwrap_one_level(raw: &Value) -> &Value {
    if let Value::Object(map) = raw {
        for key in ["data", "items", "results", "result"] {
            if let Some(inner) = map.get(key) {
                return inner;
            }
        }
    }
    raw
}

// ── Registry ─────────────────────────────────────────────────────────

/// Named transform lookup, populated at wiring time.
#[derive(Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn DataTransform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the built-in transforms.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("keyed-rows", Arc::new(KeyedRows::default()));
        registry.register("summary-split", Arc::new(SummarySplit));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, transform: Arc<dyn DataTransform>) {
        self.transforms.insert(name.into(), transform);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DataTransform>> {
        self.transforms.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.transforms.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn unwraps_data_envelope() {
        let outcome = unwrap_envelope(&json!({ "data": [{ "id": 1 }, { "id": 2 }] }));
        assert_eq!(outcome.rows.len(), 2);
        assert!(outcome.sidebar.is_none());
    }

    #[test]
    fn unwraps_items_and_results() {
        assert_eq!(unwrap_envelope(&json!({ "items": [1] })).rows, vec![json!(1)]);
        assert_eq!(unwrap_envelope(&json!({ "results": [2] })).rows, vec![json!(2)]);
    }

    #[test]
    fn bare_array_is_the_row_list() {
        let outcome = unwrap_envelope(&json!([{ "a": 1 }]));
        assert_eq!(outcome.rows, vec![json!({ "a": 1 })]);
    }

    #[test]
    fn bare_object_becomes_single_row() {
        let outcome = unwrap_envelope(&json!({ "serverTime": 1700000000 }));
        assert_eq!(outcome.rows.len(), 1);
    }

    #[test]
    fn null_yields_no_rows() {
        assert!(unwrap_envelope(&Value::Null).rows.is_empty());
    }

    #[test]
    fn keyed_rows_injects_the_key() {
        let raw = json!({
            "result": {
                "BTC-USD": { "last": "64000.1", "volume": "812.4" },
                "ETH-USD": { "last": "3400.9", "volume": "5123.0" }
            }
        });
        let outcome = KeyedRows::default().apply(&raw).unwrap();

        assert_eq!(outcome.rows.len(), 2);
        let symbols: Vec<&str> = outcome
            .rows
            .iter()
            .map(|row| row["symbol"].as_str().unwrap())
            .collect();
        assert!(symbols.contains(&"BTC-USD"));
        assert!(symbols.contains(&"ETH-USD"));
    }

    #[test]
    fn keyed_rows_rejects_non_object() {
        let err = KeyedRows::default().apply(&json!([1, 2, 3])).unwrap_err();
        assert!(err.message.contains("keyed object"));
    }

    #[test]
    fn summary_split_separates_scalars_from_rows() {
        let raw = json!({
            "equity": "1200.50",
            "currency": "USD",
            "balances": [{ "asset": "BTC", "free": "0.5" }]
        });
        let outcome = SummarySplit.apply(&raw).unwrap();

        assert_eq!(outcome.rows.len(), 1);
        let sidebar = outcome.sidebar.unwrap();
        assert_eq!(sidebar["equity"], json!("1200.50"));
        assert_eq!(sidebar["currency"], json!("USD"));
    }

    #[test]
    fn registry_resolves_builtins() {
        let registry = TransformRegistry::with_builtins();
        assert!(registry.get("keyed-rows").is_some());
        assert!(registry.get("summary-split").is_some());
        assert!(registry.get("missing").is_none());
    }
}
