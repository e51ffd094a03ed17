//! Clap derive structures for the `quotelens` CLI.
//!
//! Defines the command tree, global flags, and shared enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// quotelens -- explore crypto-exchange REST APIs from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "quotelens",
    version,
    about = "Inspect exchange REST endpoints through a configurable explorer",
    long_about = "A configuration-driven explorer for crypto-exchange REST APIs.\n\n\
        Endpoints (ticker, trades, balances, orders, ...) are declared in a\n\
        TOML catalog; quotelens handles caching, retries, and transformation.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the endpoint catalog (defaults to the platform config dir)
    #[arg(long, env = "QUOTELENS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "QUOTELENS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Request timeout in seconds (overrides api.timeout_secs)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List or inspect configured endpoints
    #[command(alias = "ep")]
    Endpoints(EndpointsArgs),

    /// Fetch an endpoint and render the result
    #[command(alias = "f")]
    Fetch(FetchArgs),

    /// Measure endpoint reachability and latency
    Probe(ProbeArgs),

    /// Inspect or clear the persisted session
    Session(SessionArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Endpoints ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EndpointsArgs {
    #[command(subcommand)]
    pub command: Option<EndpointsCommand>,
}

#[derive(Debug, Subcommand)]
pub enum EndpointsCommand {
    /// List all configured endpoints (default)
    List,

    /// Show one endpoint's full configuration
    Show { id: String },
}

// ── Fetch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Endpoint id from the catalog; defaults to the restored or
    /// configured default endpoint
    pub endpoint: Option<String>,

    /// Call-time parameter, `key=value`; repeatable. Values parse as
    /// JSON when possible, otherwise as strings.
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Bypass the response cache for this fetch
    #[arg(long)]
    pub no_cache: bool,

    /// Offer to restore the previous session before fetching
    #[arg(long)]
    pub restore: bool,

    /// Include the sidebar summary in table output
    #[arg(long)]
    pub sidebar: bool,
}

// ── Probe ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Endpoint id from the catalog
    pub endpoint: String,

    /// Call-time parameter, `key=value`; repeatable
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
    pub params: Vec<String>,
}

// ── Session ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Show the persisted session slice
    Show,

    /// Remove the persisted session
    Clear,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a commented starter catalog
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the resolved config file path
    Path,

    /// Print the loaded configuration
    Show,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
