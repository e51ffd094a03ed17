//! `probe`: one-shot reachability/latency check, no cache, no retries.

use quotelens_api::{ApiRequest, HttpExecutor, Method, ProbeReport, RetryPolicy, TransportConfig};
use quotelens_config::ExplorerConfig;
use quotelens_core::EndpointRuntime;

use crate::cli::{GlobalOpts, ProbeArgs};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    runtime: &EndpointRuntime,
    config: &ExplorerConfig,
    args: ProbeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let endpoint = runtime
        .endpoints()
        .get(&args.endpoint)
        .ok_or_else(|| CliError::UnknownEndpoint {
            id: args.endpoint.clone(),
        })?;

    let mut params = endpoint.params.clone();
    params.extend(util::parse_params(&args.params)?);

    let timeout = global
        .timeout
        .map_or_else(|| config.timeout(), std::time::Duration::from_secs);
    let transport = TransportConfig {
        timeout,
        default_headers: config.api.headers.clone(),
        ..TransportConfig::default()
    };
    let executor = HttpExecutor::new(&transport, &config.api.base_url, RetryPolicy::none())
        .map_err(|e| CliError::Config {
            message: e.to_string(),
        })?;

    let request = ApiRequest {
        method: parse_method(&endpoint.method),
        path: endpoint.url.clone(),
        headers: endpoint.headers.clone(),
        params,
    };

    let report = executor.probe(&request).await;
    let rendered = output::render_single(&global.output, &report, probe_detail);
    output::print_output(&rendered, global.quiet);

    if report.success {
        Ok(())
    } else {
        Err(CliError::ConnectionFailed {
            reason: report.error.unwrap_or_else(|| "probe failed".into()),
        })
    }
}

/// Catalog method strings are case-insensitive; the wire token is not.
fn parse_method(method: &str) -> Method {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).unwrap_or(Method::GET)
}

fn probe_detail(report: &ProbeReport) -> String {
    if report.success {
        format!(
            "OK  HTTP {}  {}ms",
            report.status.unwrap_or_default(),
            report.response_time_ms
        )
    } else {
        format!(
            "FAIL  {}ms  {}",
            report.response_time_ms,
            report.error.as_deref().unwrap_or("unknown error")
        )
    }
}
