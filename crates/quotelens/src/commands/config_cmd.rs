//! `config init` / `config path` / `config show`.

use std::path::PathBuf;

use quotelens_config::{ExplorerConfig, config_path, load_config, sample_config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

/// Resolve the config file path from the `--config` flag or the platform
/// default.
pub fn resolve_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { force } => init(global, force),
        ConfigCommand::Path => {
            output::print_output(&resolve_path(global).display().to_string(), global.quiet);
            Ok(())
        }
        ConfigCommand::Show => show(global),
    }
}

fn init(global: &GlobalOpts, force: bool) -> Result<(), CliError> {
    let path = resolve_path(global);
    if path.exists() && !force {
        return Err(CliError::Validation {
            field: "config".into(),
            reason: format!("{} already exists (use --force to overwrite)", path.display()),
        });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, sample_config())?;

    output::print_output(&format!("Wrote {}", path.display()), global.quiet);
    Ok(())
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let path = resolve_path(global);
    if !path.exists() {
        return Err(CliError::NoConfig {
            path: path.display().to_string(),
        });
    }

    let config = load_config(&path)?;
    let rendered = output::render_single(&global.output, &config, config_detail);
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn config_detail(config: &ExplorerConfig) -> String {
    toml::to_string_pretty(config).unwrap_or_else(|e| format!("serialization error: {e}"))
}
