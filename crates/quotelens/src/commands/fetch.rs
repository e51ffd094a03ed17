//! `fetch`: run one load through the runtime and render the result.

use quotelens_core::EndpointRuntime;

use crate::cli::{FetchArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    runtime: &EndpointRuntime,
    args: FetchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let params = util::parse_params(&args.params)?;

    let offer_restore = args.restore;
    let yes = global.yes;
    runtime.initialize(|saved| {
        if !offer_restore {
            return false;
        }
        if yes {
            return true;
        }
        let endpoint = saved.current_endpoint.as_deref().unwrap_or("(default)");
        util::confirm(
            &format!("Restore previous session (endpoint '{endpoint}')?"),
            false,
        )
        .unwrap_or(false)
    });

    // Switching endpoints wipes the parameter slate, so skip the switch
    // when the target is already current (a restored session keeps its
    // parameters that way).
    if let Some(ref id) = args.endpoint {
        let current = runtime.state().current_endpoint.clone();
        if current.as_deref() != Some(id.as_str()) {
            runtime.update_endpoint(id)?;
        }
    }

    if !params.is_empty() {
        runtime.update_parameters(params);
    }

    if args.no_cache {
        let endpoint = runtime.state().current_endpoint.clone();
        runtime.clear_cache(endpoint.as_deref());
    }

    runtime.load().await?;

    let state = runtime.state();
    let columns = state
        .current_endpoint
        .as_deref()
        .and_then(|id| runtime.endpoints().get(id))
        .map(|e| e.columns.clone())
        .unwrap_or_default();

    let rendered = output::render_rows(&global.output, &state.table_data, &columns);
    output::print_output(&rendered, global.quiet);

    if matches!(global.output, OutputFormat::Table) && !global.quiet {
        if args.sidebar {
            if let Some(ref sidebar) = state.sidebar_data {
                let pretty = serde_json::to_string_pretty(sidebar)?;
                println!("\nSidebar:\n{pretty}");
            }
        }
        if let Some(ref meta) = state.response_metadata {
            let color = output::should_color(&global.color);
            println!("{}", output::render_metadata(meta, color));
        }
    }

    Ok(())
}
