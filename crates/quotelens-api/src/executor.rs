// HTTP execution with timeout, classified retry, and error normalization.
//
// One `HttpExecutor` wraps a shared reqwest::Client for a single API base
// URL. Every failure leaving `execute` is already normalized into
// `Error` -- callers never see raw transport exceptions.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, status_message};
use crate::request::{self, stringify};
use crate::transport::TransportConfig;

// ── Retry policy ─────────────────────────────────────────────────────

/// Backoff schedule for retry-eligible failures.
///
/// Attempt N (1-based) that fails retries after `delays[N-1]`, clamped to
/// the last entry when N exceeds the schedule length.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retries after the initial attempt.
    pub max_retries: u32,
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delays: vec![
                Duration::from_millis(1_000),
                Duration::from_millis(2_000),
                Duration::from_millis(4_000),
            ],
        }
    }
}

impl RetryPolicy {
    /// No retries at all (probes, tests).
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delays: Vec::new(),
        }
    }

    /// Delay before the retry that follows failed attempt `attempt` (1-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        if self.delays.is_empty() {
            return Duration::ZERO;
        }
        let idx = usize::try_from(attempt.saturating_sub(1)).unwrap_or(usize::MAX);
        self.delays
            .get(idx)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

// ── Request / response shapes ────────────────────────────────────────

/// One logical request, already merged from endpoint defaults and
/// call-time parameters by the caller.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path template, may contain `{param}` placeholders.
    pub path: String,
    /// Endpoint-specific headers; override the transport's global defaults.
    pub headers: HashMap<String, String>,
    /// Merged parameter set. Placeholders consume their keys; the rest go
    /// to the query string (GET/DELETE) or the JSON body (other methods).
    pub params: BTreeMap<String, Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            headers: HashMap::new(),
            params: BTreeMap::new(),
        }
    }
}

/// Raw decoded response. Transformation is the caller's responsibility.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
    pub elapsed: Duration,
}

/// Reachability/latency report from [`HttpExecutor::probe`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProbeReport {
    pub success: bool,
    pub response_time_ms: u64,
    pub status: Option<u16>,
    pub error: Option<String>,
}

// ── Executor ─────────────────────────────────────────────────────────

/// Issues logical requests against one API base URL, applying timeout,
/// classified retry with backoff, and error normalization.
pub struct HttpExecutor {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
    timeout: Duration,
}

impl HttpExecutor {
    /// Build an executor from transport config and a base URL.
    pub fn new(transport: &TransportConfig, base_url: &str, retry: RetryPolicy) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Url::parse(base_url)?;
        Ok(Self {
            http,
            base_url,
            retry,
            timeout: transport.timeout,
        })
    }

    /// Wrap an existing `reqwest::Client` (tests, embedding hosts).
    pub fn with_client(http: reqwest::Client, base_url: Url, retry: RetryPolicy) -> Self {
        Self {
            http,
            base_url,
            retry,
            timeout: Duration::from_secs(30),
        }
    }

    /// Execute one logical request, retrying eligible failures per policy.
    ///
    /// Returns the raw decoded JSON body unmodified on success.
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.dispatch(request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt <= self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Measure reachability and latency of an endpoint.
    ///
    /// Same execution path as [`execute`](Self::execute), but the outcome
    /// is folded into a report instead of an error -- probes never fail.
    pub async fn probe(&self, request: &ApiRequest) -> ProbeReport {
        let started = Instant::now();
        let outcome = self.execute(request).await;
        let response_time_ms =
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(response) => ProbeReport {
                success: true,
                response_time_ms,
                status: Some(response.status),
                error: None,
            },
            Err(err) => ProbeReport {
                success: false,
                response_time_ms,
                status: match err.status() {
                    0 => None,
                    s => Some(s),
                },
                error: Some(err.to_string()),
            },
        }
    }

    // ── Single attempt ───────────────────────────────────────────────

    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, Error> {
        let built = request::build_path(&request.path, &request.params);
        let url = self.base_url.join(&built.path)?;

        let mut req = self.http.request(request.method.clone(), url.clone());
        for (name, value) in &request.headers {
            req = req.header(name, value);
        }

        // GET/DELETE carry remaining params in the query string; mutating
        // methods send them as the JSON body.
        req = match request.method {
            Method::GET | Method::DELETE => {
                if built.remaining.is_empty() {
                    req
                } else {
                    req.query(&query_pairs(&built.remaining))
                }
            }
            _ => req.json(&built.remaining),
        };

        debug!(method = %request.method, %url, "dispatching request");
        let started = Instant::now();

        let response = req.send().await.map_err(|e| self.map_send_error(&e))?;
        let status = response.status().as_u16();
        let elapsed = started.elapsed();

        if !(200..300).contains(&status) {
            return Err(Error::Http {
                status,
                message: status_message(status),
            });
        }

        let body_text = response.text().await.map_err(|e| self.map_send_error(&e))?;
        let body = if body_text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body_text).map_err(|e| Error::InvalidData {
                message: e.to_string(),
                body: body_text,
            })?
        };

        Ok(ApiResponse {
            status,
            body,
            elapsed,
        })
    }

    fn map_send_error(&self, err: &reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            Error::Network {
                message: err.to_string(),
            }
        }
    }
}

/// Render remaining params as query pairs.
fn query_pairs(params: &BTreeMap<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| (k.clone(), stringify(v)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn delay_clamps_to_last_entry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2_000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4_000));
        assert_eq!(policy.delay_for(9), Duration::from_millis(4_000));
    }

    #[test]
    fn empty_schedule_yields_zero_delay() {
        assert_eq!(RetryPolicy::none().delay_for(1), Duration::ZERO);
    }

    #[test]
    fn query_pairs_preserve_sorted_order() {
        let mut params = BTreeMap::new();
        params.insert("z".to_owned(), serde_json::json!(1));
        params.insert("a".to_owned(), serde_json::json!("two"));
        let pairs = query_pairs(&params);
        assert_eq!(pairs[0], ("a".to_owned(), "two".to_owned()));
        assert_eq!(pairs[1], ("z".to_owned(), "1".to_owned()));
    }
}
