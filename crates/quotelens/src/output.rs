//! Output formatting: table, JSON, YAML, plain.
//!
//! Rows are untyped JSON objects, so tables are assembled with
//! `tabled::builder::Builder` from the endpoint's column specs rather
//! than a `Tabled` derive.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use quotelens_core::{ColumnSpec, ResponseMetadata};

use crate::cli::{ColorMode, OutputFormat};

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render the row list in the chosen format.
///
/// - `table`: columns from the endpoint config, or unioned object keys
/// - `json` / `json-compact` / `yaml`: the raw rows via serde
/// - `plain`: the first column's value per row, one per line
pub fn render_rows(format: &OutputFormat, rows: &[Value], columns: &[ColumnSpec]) -> String {
    match format {
        OutputFormat::Table => render_table(rows, columns),
        OutputFormat::Json => render_json(rows, false),
        OutputFormat::JsonCompact => render_json(rows, true),
        OutputFormat::Yaml => render_yaml(rows),
        OutputFormat::Plain => {
            let specs = effective_columns(rows, columns);
            rows.iter()
                .map(|row| specs.first().map(|c| cell(row, &c.field)).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Render a single serde-serializable item in the chosen format.
pub fn render_single<T: serde::Serialize>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> String {
    match format {
        OutputFormat::Table | OutputFormat::Plain => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
    }
}

/// One-line fetch summary: status, latency, row count, cache origin.
pub fn render_metadata(meta: &ResponseMetadata, color: bool) -> String {
    let origin = if meta.from_cache { "cache" } else { "network" };
    let line = format!(
        "{} rows | HTTP {} | {}ms | {}",
        meta.data_count, meta.status_code, meta.response_time_ms, origin
    );
    if color {
        format!("{}", line.dimmed())
    } else {
        line
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table(rows: &[Value], columns: &[ColumnSpec]) -> String {
    if rows.is_empty() {
        return "(no rows)".into();
    }

    let specs = effective_columns(rows, columns);
    let mut builder = Builder::default();
    builder.push_record(specs.iter().map(|c| c.label().to_owned()));
    for row in rows {
        builder.push_record(specs.iter().map(|c| cell(row, &c.field)));
    }

    builder.build().with(Style::rounded()).to_string()
}

/// Use configured columns when present; otherwise derive them from the
/// union of keys across the first rows.
fn effective_columns(rows: &[Value], columns: &[ColumnSpec]) -> Vec<ColumnSpec> {
    if !columns.is_empty() {
        return columns.to_vec();
    }

    let mut fields: Vec<String> = Vec::new();
    for row in rows.iter().take(20) {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !fields.contains(key) {
                    fields.push(key.clone());
                }
            }
        }
    }
    if fields.is_empty() {
        fields.push("value".into());
    }

    fields
        .into_iter()
        .map(|field| ColumnSpec { field, label: None })
        .collect()
}

/// Extract one cell, rendering scalars bare and nested values as compact
/// JSON. A row that is not an object renders under the synthetic "value"
/// column.
fn cell(row: &Value, field: &str) -> String {
    let value = match row {
        Value::Object(map) => map.get(field).unwrap_or(&Value::Null),
        other if field == "value" => other,
        _ => &Value::Null,
    };
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let result = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    result.unwrap_or_else(|e| format!("serialization error: {e}"))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).unwrap_or_else(|e| format!("serialization error: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn table_uses_configured_columns() {
        let rows = vec![json!({ "symbol": "BTC-USD", "last": "64000.1", "noise": 1 })];
        let columns = vec![
            ColumnSpec { field: "symbol".into(), label: Some("Pair".into()) },
            ColumnSpec { field: "last".into(), label: None },
        ];

        let table = render_table(&rows, &columns);
        assert!(table.contains("Pair"));
        assert!(table.contains("64000.1"));
        assert!(!table.contains("noise"));
    }

    #[test]
    fn table_derives_columns_from_row_keys() {
        let rows = vec![json!({ "a": 1 }), json!({ "a": 2, "b": "x" })];
        let table = render_table(&rows, &[]);
        assert!(table.contains('a'));
        assert!(table.contains('b'));
    }

    #[test]
    fn empty_rows_render_placeholder() {
        assert_eq!(render_table(&[], &[]), "(no rows)");
    }

    #[test]
    fn plain_emits_first_column_per_line() {
        let rows = vec![json!({ "symbol": "BTC-USD" }), json!({ "symbol": "ETH-USD" })];
        let columns = vec![ColumnSpec { field: "symbol".into(), label: None }];
        let out = render_rows(&OutputFormat::Plain, &rows, &columns);
        assert_eq!(out, "BTC-USD\nETH-USD");
    }

    #[test]
    fn scalar_rows_render_under_value_column() {
        let rows = vec![json!("XBT"), json!("ETH")];
        let out = render_rows(&OutputFormat::Plain, &rows, &[]);
        assert_eq!(out, "XBT\nETH");
    }
}
