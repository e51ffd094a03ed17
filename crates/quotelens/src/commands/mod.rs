//! Command dispatch: bridges CLI args -> runtime operations -> output.

pub mod config_cmd;
pub mod endpoints;
pub mod fetch;
pub mod probe;
pub mod session_cmd;
pub mod util;

use quotelens_config::ExplorerConfig;
use quotelens_core::EndpointRuntime;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a catalog-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    runtime: &EndpointRuntime,
    config: &ExplorerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Endpoints(args) => endpoints::handle(runtime, args, global),
        Command::Fetch(args) => fetch::handle(runtime, args, global).await,
        Command::Probe(args) => probe::handle(runtime, config, args, global).await,
        Command::Session(args) => session_cmd::handle(runtime, args, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
