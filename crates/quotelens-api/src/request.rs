// Pure request construction: URL-template substitution and parameter
// stringification. No I/O here -- the executor owns the network.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

/// Result of expanding a URL template against a parameter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPath {
    /// The path with every matched `{key}` placeholder substituted.
    pub path: String,
    /// Parameters not consumed by a placeholder; these become the query
    /// string (GET/DELETE) or the JSON body (POST/PUT/PATCH).
    pub remaining: BTreeMap<String, Value>,
}

/// Expand `{key}` placeholders in `template` from `params`.
///
/// Matched keys are removed from the returned remaining set. A placeholder
/// with no matching parameter stays literal in the path -- the server's
/// error plus the warning below make the omission visible without turning
/// exploratory requests into hard failures.
pub fn build_path(template: &str, params: &BTreeMap<String, Value>) -> BuiltPath {
    let mut path = template.to_owned();
    let mut remaining = params.clone();

    for key in placeholder_keys(template) {
        let token = format!("{{{key}}}");
        match remaining.remove(&key) {
            Some(value) => {
                path = path.replace(&token, &stringify(&value));
            }
            None => {
                warn!(template, placeholder = %key, "no parameter for URL placeholder, leaving literal");
            }
        }
    }

    BuiltPath { path, remaining }
}

/// Render a JSON parameter value for use in a path segment or query string.
///
/// Strings pass through verbatim; everything else uses compact JSON, which
/// is stable because object keys come from a `BTreeMap`.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Extract `{key}` placeholder names from a template, in order of occurrence.
fn placeholder_keys(template: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        let key = &rest[open + 1..open + close];
        if !key.is_empty() {
            keys.push(key.to_owned());
        }
        rest = &rest[open + close + 1..];
    }
    keys
}
