// ── Endpoint model ──
//
// Static, immutable descriptions of the API operations the explorer can
// issue. Built once from configuration and shared via Arc thereafter.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Presentation metadata for one table column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Field name looked up in each row object.
    pub field: String,
    /// Column header; defaults to the field name.
    #[serde(default)]
    pub label: Option<String>,
}

impl ColumnSpec {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.field)
    }
}

/// Static description of one API operation.
///
/// Created at configuration-load time and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub id: String,

    /// Human-readable name for listings.
    #[serde(default)]
    pub label: Option<String>,

    /// Path template relative to the API base URL; may contain `{param}`
    /// placeholders.
    pub url: String,

    /// HTTP method; validated against the supported set at load time.
    #[serde(default = "default_method")]
    pub method: String,

    /// Endpoint-specific headers, merged over the global defaults.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Default parameters, merged under call-time parameters.
    #[serde(default)]
    pub params: BTreeMap<String, Value>,

    #[serde(default = "default_cacheable")]
    pub cacheable: bool,

    #[serde(default = "default_cache_duration_ms")]
    pub cache_duration_ms: u64,

    /// Name of a registered transform; `None` falls back to envelope
    /// unwrapping.
    #[serde(default)]
    pub transform: Option<String>,

    /// Column metadata, presentation-only.
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

fn default_method() -> String {
    "GET".into()
}

fn default_cacheable() -> bool {
    true
}

fn default_cache_duration_ms() -> u64 {
    30_000
}

impl EndpointConfig {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

const SUPPORTED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

/// The full, read-only endpoint catalog for one explorer configuration.
///
/// Iteration order follows configuration order.
#[derive(Debug, Clone)]
pub struct EndpointSet {
    config_id: String,
    default_endpoint: Option<String>,
    endpoints: IndexMap<String, Arc<EndpointConfig>>,
}

impl EndpointSet {
    /// Build and validate the catalog.
    ///
    /// Rejects empty catalogs, duplicate ids, unknown methods, empty URL
    /// templates, and a default endpoint that is not in the catalog.
    pub fn new(
        config_id: impl Into<String>,
        default_endpoint: Option<String>,
        endpoints: Vec<EndpointConfig>,
    ) -> Result<Self, CoreError> {
        if endpoints.is_empty() {
            return Err(CoreError::Config {
                message: "no endpoints configured".into(),
            });
        }

        let mut map = IndexMap::with_capacity(endpoints.len());
        for endpoint in endpoints {
            if endpoint.url.trim().is_empty() {
                return Err(CoreError::Config {
                    message: format!("endpoint '{}' has an empty URL template", endpoint.id),
                });
            }
            let method = endpoint.method.to_ascii_uppercase();
            if !SUPPORTED_METHODS.contains(&method.as_str()) {
                return Err(CoreError::Config {
                    message: format!(
                        "endpoint '{}' uses unsupported method '{}'",
                        endpoint.id, endpoint.method
                    ),
                });
            }
            if map
                .insert(endpoint.id.clone(), Arc::new(endpoint))
                .is_some()
            {
                return Err(CoreError::Config {
                    message: "duplicate endpoint id in configuration".into(),
                });
            }
        }

        if let Some(ref id) = default_endpoint {
            if !map.contains_key(id) {
                return Err(CoreError::Config {
                    message: format!("default endpoint '{id}' is not configured"),
                });
            }
        }

        Ok(Self {
            config_id: config_id.into(),
            default_endpoint,
            endpoints: map,
        })
    }

    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    /// The configured default, or the first endpoint in configuration order.
    pub fn default_endpoint(&self) -> &str {
        self.default_endpoint.as_deref().unwrap_or_else(|| {
            self.endpoints
                .keys()
                .next()
                .map(String::as_str)
                .unwrap_or_default()
        })
    }

    pub fn get(&self, id: &str) -> Option<Arc<EndpointConfig>> {
        self.endpoints.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.endpoints.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<EndpointConfig>> {
        self.endpoints.values()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
