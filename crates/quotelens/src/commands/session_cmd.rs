//! `session show` / `session clear`.

use quotelens_core::{EndpointRuntime, SessionSnapshot};

use crate::cli::{GlobalOpts, SessionArgs, SessionCommand};
use crate::error::CliError;
use crate::output;

use super::util;

pub fn handle(
    runtime: &EndpointRuntime,
    args: SessionArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SessionCommand::Show => show(runtime, global),
        SessionCommand::Clear => clear(runtime, global),
    }
}

fn show(runtime: &EndpointRuntime, global: &GlobalOpts) -> Result<(), CliError> {
    match runtime.saved_session()? {
        Some(snapshot) => {
            let rendered = output::render_single(&global.output, &snapshot, session_detail);
            output::print_output(&rendered, global.quiet);
        }
        None => output::print_output("No saved session.", global.quiet),
    }
    Ok(())
}

fn clear(runtime: &EndpointRuntime, global: &GlobalOpts) -> Result<(), CliError> {
    if runtime.saved_session()?.is_none() {
        output::print_output("No saved session.", global.quiet);
        return Ok(());
    }

    if !util::confirm("Remove the saved session?", global.yes)? {
        output::print_output("Aborted.", global.quiet);
        return Ok(());
    }

    runtime.clear_session()?;
    output::print_output("Session cleared.", global.quiet);
    Ok(())
}

fn session_detail(snapshot: &SessionSnapshot) -> String {
    let mut lines = vec![
        format!(
            "Endpoint:          {}",
            snapshot.current_endpoint.as_deref().unwrap_or("(default)")
        ),
        format!("Sidebar collapsed: {}", snapshot.sidebar_collapsed),
        format!("Sidebar pinned:    {}", snapshot.sidebar_pinned),
    ];
    if !snapshot.parameters.is_empty() {
        lines.push("Parameters:".into());
        for (key, value) in &snapshot.parameters {
            lines.push(format!("  {key} = {value}"));
        }
    }
    lines.join("\n")
}
