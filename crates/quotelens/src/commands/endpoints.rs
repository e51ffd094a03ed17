//! `endpoints list` / `endpoints show`.

use serde_json::{Value, json};

use quotelens_core::{ColumnSpec, EndpointConfig, EndpointRuntime};

use crate::cli::{EndpointsArgs, EndpointsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(
    runtime: &EndpointRuntime,
    args: EndpointsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command.unwrap_or(EndpointsCommand::List) {
        EndpointsCommand::List => list(runtime, global),
        EndpointsCommand::Show { id } => show(runtime, &id, global),
    }
}

fn list(runtime: &EndpointRuntime, global: &GlobalOpts) -> Result<(), CliError> {
    let rows: Vec<Value> = runtime
        .endpoints()
        .iter()
        .map(|e| {
            json!({
                "id": e.id,
                "label": e.label(),
                "method": e.method,
                "url": e.url,
                "cacheable": e.cacheable,
                "cache_ms": e.cache_duration_ms,
                "transform": e.transform,
            })
        })
        .collect();

    let columns = vec![
        column("id", "ID"),
        column("label", "Label"),
        column("method", "Method"),
        column("url", "URL"),
        column("cacheable", "Cache"),
        column("cache_ms", "TTL (ms)"),
        column("transform", "Transform"),
    ];

    let rendered = output::render_rows(&global.output, &rows, &columns);
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn show(runtime: &EndpointRuntime, id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let endpoint = runtime
        .endpoints()
        .get(id)
        .ok_or_else(|| CliError::UnknownEndpoint { id: id.to_owned() })?;

    let rendered = output::render_single(&global.output, endpoint.as_ref(), endpoint_detail);
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn endpoint_detail(e: &EndpointConfig) -> String {
    let mut lines = vec![
        format!("Endpoint:  {}", e.id),
        format!("Label:     {}", e.label()),
        format!("Method:    {}", e.method),
        format!("URL:       {}", e.url),
        format!(
            "Cache:     {}",
            if e.cacheable {
                format!("{} ms", e.cache_duration_ms)
            } else {
                "disabled".into()
            }
        ),
    ];
    if let Some(ref transform) = e.transform {
        lines.push(format!("Transform: {transform}"));
    }
    if !e.params.is_empty() {
        lines.push("Default parameters:".into());
        for (key, value) in &e.params {
            lines.push(format!("  {key} = {value}"));
        }
    }
    if !e.headers.is_empty() {
        lines.push("Headers:".into());
        for (key, value) in &e.headers {
            lines.push(format!("  {key}: {value}"));
        }
    }
    if !e.columns.is_empty() {
        let fields: Vec<&str> = e.columns.iter().map(|c| c.field.as_str()).collect();
        lines.push(format!("Columns:   {}", fields.join(", ")));
    }
    lines.join("\n")
}

fn column(field: &str, label: &str) -> ColumnSpec {
    ColumnSpec {
        field: field.into(),
        label: Some(label.into()),
    }
}
