mod cli;
mod commands;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use quotelens_api::{HttpExecutor, RetryPolicy, TransportConfig};
use quotelens_config::{ExplorerConfig, FileSessionStore, load_config};
use quotelens_core::{CacheConfig, EndpointRuntime, TransformRegistry};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a catalog or network stack
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "quotelens", &mut std::io::stdout());
            Ok(())
        }

        // Everything else runs against the loaded catalog
        cmd => {
            let config = load_explorer_config(&cli.global)?;
            let runtime = build_runtime(&config, &cli.global)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &runtime, &config, &cli.global).await;
            runtime.shutdown();
            result
        }
    }
}

fn load_explorer_config(global: &cli::GlobalOpts) -> Result<ExplorerConfig, CliError> {
    let path = commands::config_cmd::resolve_path(global);
    if !path.exists() {
        return Err(CliError::NoConfig {
            path: path.display().to_string(),
        });
    }
    Ok(load_config(&path)?)
}

/// Wire an `EndpointRuntime` from the loaded configuration.
fn build_runtime(
    config: &ExplorerConfig,
    global: &cli::GlobalOpts,
) -> Result<EndpointRuntime, CliError> {
    let endpoints = config.endpoint_set()?;

    let mut transport = TransportConfig {
        timeout: effective_timeout(config, global),
        default_headers: config.api.headers.clone(),
        ..TransportConfig::default()
    };
    if let Some(ref user_agent) = config.api.user_agent {
        transport.user_agent = user_agent.clone();
    }

    let retry = RetryPolicy {
        max_retries: config.retry.max_retries,
        delays: config.retry_delays(),
    };
    let executor = HttpExecutor::new(&transport, &config.api.base_url, retry).map_err(|e| {
        CliError::Config {
            message: e.to_string(),
        }
    })?;

    let cache = CacheConfig {
        max_entries: config.cache.max_entries,
        evict_batch: config.cache.evict_batch,
        sweep_interval: config.sweep_interval(),
    };

    Ok(EndpointRuntime::new(
        endpoints,
        TransformRegistry::with_builtins(),
        executor,
        cache,
        Arc::new(FileSessionStore::new()),
    ))
}

/// The `--timeout` flag wins over `api.timeout_secs`.
fn effective_timeout(config: &ExplorerConfig, global: &cli::GlobalOpts) -> std::time::Duration {
    global
        .timeout
        .map_or_else(|| config.timeout(), std::time::Duration::from_secs)
}
