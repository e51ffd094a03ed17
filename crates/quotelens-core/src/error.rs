// ── Core error types ──
//
// User-facing errors from quotelens-core. Consumers never see raw
// transport exceptions -- the `From<quotelens_api::Error>` impl carries
// the already-normalized message and status across the boundary.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Endpoint selection ───────────────────────────────────────────
    #[error("Unknown endpoint: {id}")]
    UnknownEndpoint { id: String },

    #[error("No endpoint selected")]
    NoEndpointSelected,

    // ── API errors (already normalized by quotelens-api) ─────────────
    #[error("{message}")]
    Api {
        message: String,
        /// HTTP status; 0 when no response was received.
        status: u16,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Invalid data format: {message}")]
    Transform { message: String },

    // ── Persistence ──────────────────────────────────────────────────
    #[error("Session storage error: {message}")]
    Session { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl From<quotelens_api::Error> for CoreError {
    fn from(err: quotelens_api::Error) -> Self {
        match err {
            quotelens_api::Error::InvalidData { message, body: _ } => {
                CoreError::Transform { message }
            }
            other => CoreError::Api {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

impl From<crate::transform::TransformError> for CoreError {
    fn from(err: crate::transform::TransformError) -> Self {
        CoreError::Transform {
            message: err.to_string(),
        }
    }
}
