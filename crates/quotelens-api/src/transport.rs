// Shared transport configuration for building reqwest::Client instances.
//
// The executor and one-shot probes share timeout, user-agent, and global
// header settings through this module.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Hard upper bound on a single request attempt.
    pub timeout: Duration,
    /// User-Agent sent on every request.
    pub user_agent: String,
    /// Global default headers. Endpoint-specific headers override these
    /// at request-build time, not here.
    pub default_headers: HashMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("quotelens/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                crate::error::Error::ClientBuild(format!("invalid header name {name:?}: {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                crate::error::Error::ClientBuild(format!("invalid header value for {name}: {e}"))
            })?;
            headers.insert(name, value);
        }

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| crate::error::Error::ClientBuild(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_30s() {
        assert_eq!(TransportConfig::default().timeout, Duration::from_secs(30));
    }

    #[test]
    fn builds_client_with_custom_headers() {
        let mut config = TransportConfig::default();
        config
            .default_headers
            .insert("x-source".into(), "quotelens".into());
        config.build_client().unwrap();
    }

    #[test]
    fn rejects_invalid_header_name() {
        let mut config = TransportConfig::default();
        config
            .default_headers
            .insert("bad header".into(), "v".into());
        assert!(config.build_client().is_err());
    }
}
