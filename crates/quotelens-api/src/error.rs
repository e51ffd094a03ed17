use thiserror::Error;

/// Top-level error type for the `quotelens-api` crate.
///
/// Every transport failure is normalized into one of these variants before
/// it leaves the crate. `quotelens-core` only ever sees this shape -- it
/// never inspects raw `reqwest` errors or response bodies.
#[derive(Debug, Error)]
pub enum Error {
    // ── HTTP ────────────────────────────────────────────────────────
    /// The server answered with a non-success status code.
    ///
    /// `message` comes from the static status table (see [`status_message`]).
    #[error("{message}")]
    Http { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// No response reached us at all (DNS failure, connection refused,
    /// connection reset mid-flight). Reported as status 0.
    #[error("Unable to connect: {message}")]
    Network { message: String },

    /// The request exceeded the configured hard timeout.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client itself could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The response body was not valid JSON, with the raw body for debugging.
    #[error("Invalid data format: {message}")]
    InvalidData { message: String, body: String },
}

impl Error {
    /// The HTTP status associated with this error, or 0 when no response
    /// was received (network failure, local timeout).
    pub fn status(&self) -> u16 {
        match self {
            Self::Http { status, .. } => *status,
            _ => 0,
        }
    }

    /// Returns `true` if this failure is worth retrying.
    ///
    /// Eligible: network failures, timeouts, 5xx, 408, and 429.
    /// Other 4xx and malformed payloads are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::Http { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            _ => false,
        }
    }
}

/// Human-readable message for an HTTP status code.
///
/// Covers the statuses exchange APIs commonly return; anything unmapped
/// falls back to a generic templated message.
pub fn status_message(status: u16) -> String {
    match status {
        400 => "Bad request".into(),
        401 => "Unauthorized".into(),
        403 => "Forbidden".into(),
        404 => "Not found".into(),
        408 => "Request timeout".into(),
        429 => "Rate limit exceeded".into(),
        500 => "Internal server error".into(),
        502 => "Bad gateway".into(),
        503 => "Service unavailable".into(),
        504 => "Gateway timeout".into(),
        other => format!("[{other}] HTTP error"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(Error::Network { message: "refused".into() }.is_retryable());
        assert!(Error::Timeout { timeout_ms: 30_000 }.is_retryable());
        assert!(Error::Http { status: 500, message: status_message(500) }.is_retryable());
        assert!(Error::Http { status: 503, message: status_message(503) }.is_retryable());
        assert!(Error::Http { status: 408, message: status_message(408) }.is_retryable());
        assert!(Error::Http { status: 429, message: status_message(429) }.is_retryable());

        assert!(!Error::Http { status: 404, message: status_message(404) }.is_retryable());
        assert!(!Error::Http { status: 400, message: status_message(400) }.is_retryable());
        assert!(!Error::InvalidData { message: "bad json".into(), body: "{".into() }.is_retryable());
    }

    #[test]
    fn network_errors_report_status_zero() {
        let err = Error::Network { message: "dns".into() };
        assert_eq!(err.status(), 0);
    }

    #[test]
    fn unmapped_status_uses_generic_template() {
        assert_eq!(status_message(418), "[418] HTTP error");
        assert_eq!(status_message(429), "Rate limit exceeded");
    }
}
