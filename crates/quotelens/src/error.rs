//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`/`ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use quotelens_config::ConfigError;
use quotelens_core::CoreError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Endpoints ────────────────────────────────────────────────────
    #[error("Endpoint '{id}' is not configured")]
    #[diagnostic(
        code(quotelens::unknown_endpoint),
        help("Run: quotelens endpoints list to see the catalog")
    )]
    UnknownEndpoint { id: String },

    // ── Network ──────────────────────────────────────────────────────
    #[error("Could not reach the API")]
    #[diagnostic(
        code(quotelens::connection_failed),
        help("Check api.base_url in your config and your network connection.\nReason: {reason}")
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(quotelens::timeout),
        help("Increase api.timeout_secs in your config or check API responsiveness.")
    )]
    Timeout,

    #[error("API error: {message}")]
    #[diagnostic(code(quotelens::api_error))]
    Api { message: String, status: u16 },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(quotelens::invalid_data),
        help("The endpoint's transform does not match the payload shape.\nCheck the `transform` field for this endpoint.")
    )]
    InvalidData { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(quotelens::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found")]
    #[diagnostic(
        code(quotelens::no_config),
        help("Create one with: quotelens config init\nExpected at: {path}")
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(quotelens::config))]
    Config { message: String },

    // ── Persistence ──────────────────────────────────────────────────
    #[error("Session storage error: {message}")]
    #[diagnostic(code(quotelens::session))]
    Session { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(quotelens::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::UnknownEndpoint { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Api { status: 404, .. } => exit_code::NOT_FOUND,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownEndpoint { id } => CliError::UnknownEndpoint { id },

            CoreError::NoEndpointSelected => CliError::Validation {
                field: "endpoint".into(),
                reason: "no endpoint selected".into(),
            },

            CoreError::Api { message, status } => match status {
                0 if message.starts_with("Request timed out") => CliError::Timeout,
                0 => CliError::ConnectionFailed { reason: message },
                _ => CliError::Api { message, status },
            },

            CoreError::Transform { message } => CliError::InvalidData { message },

            CoreError::Session { message } => CliError::Session { message },

            CoreError::Config { message } => CliError::Config { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(err) => CliError::Io(err),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
