#![allow(clippy::unwrap_used)]
// Integration tests for `HttpExecutor` using wiremock.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use quotelens_api::{ApiRequest, Error, HttpExecutor, RetryPolicy, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

/// Executor with retries enabled but zero backoff, so retry tests run fast.
fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        delays: vec![Duration::ZERO],
    }
}

async fn setup(retry: RetryPolicy) -> (MockServer, HttpExecutor) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let executor = HttpExecutor::with_client(reqwest::Client::new(), base_url, retry);
    (server, executor)
}

// ── Success path ────────────────────────────────────────────────────

#[tokio::test]
async fn returns_raw_body_unmodified() {
    let (server, executor) = setup(RetryPolicy::none()).await;

    let payload = json!({ "result": { "BTC-USD": { "last": "64123.5" } } });
    Mock::given(method("GET"))
        .and(path("/v1/ticker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&payload))
        .mount(&server)
        .await;

    let response = executor.execute(&ApiRequest::get("/v1/ticker")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, payload);
}

#[tokio::test]
async fn substitutes_path_placeholders_and_queries_the_rest() {
    let (server, executor) = setup(RetryPolicy::none()).await;

    Mock::given(method("GET"))
        .and(path("/v1/ticker/BTC-USD"))
        .and(query_param("depth", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = ApiRequest::get("/v1/ticker/{pair}");
    request.params = BTreeMap::from([
        ("pair".to_owned(), json!("BTC-USD")),
        ("depth".to_owned(), json!(10)),
    ]);

    executor.execute(&request).await.unwrap();
}

#[tokio::test]
async fn endpoint_headers_are_sent() {
    let (server, executor) = setup(RetryPolicy::none()).await;

    Mock::given(method("GET"))
        .and(path("/v1/account"))
        .and(header("x-channel", "explorer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = ApiRequest::get("/v1/account");
    request
        .headers
        .insert("x-channel".to_owned(), "explorer".to_owned());

    executor.execute(&request).await.unwrap();
}

#[tokio::test]
async fn empty_body_decodes_to_null() {
    let (server, executor) = setup(RetryPolicy::none()).await;

    Mock::given(method("GET"))
        .and(path("/v1/ping"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let response = executor.execute(&ApiRequest::get("/v1/ping")).await.unwrap();
    assert!(response.body.is_null());
}

// ── Retry policy ────────────────────────────────────────────────────

#[tokio::test]
async fn retry_ceiling_is_four_total_attempts_on_503() {
    let (server, executor) = setup(fast_retry()).await;

    Mock::given(method("GET"))
        .and(path("/v1/trades"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4) // 1 initial + 3 retries
        .mount(&server)
        .await;

    let err = executor
        .execute(&ApiRequest::get("/v1/trades"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http { status: 503, .. }), "got: {err:?}");
    assert_eq!(err.to_string(), "Service unavailable");
}

#[tokio::test]
async fn no_retry_on_404() {
    let (server, executor) = setup(fast_retry()).await;

    Mock::given(method("GET"))
        .and(path("/v1/orders/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = executor
        .execute(&ApiRequest::get("/v1/orders/missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http { status: 404, .. }));
    assert_eq!(err.to_string(), "Not found");
}

#[tokio::test]
async fn rate_limit_is_retried_until_success() {
    let (server, executor) = setup(fast_retry()).await;

    // First attempt hits the rate limiter, the retry succeeds.
    Mock::given(method("GET"))
        .and(path("/v1/balances"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/balances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let response = executor
        .execute(&ApiRequest::get("/v1/balances"))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn invalid_json_is_terminal() {
    let (server, executor) = setup(fast_retry()).await;

    Mock::given(method("GET"))
        .and(path("/v1/ticker"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .expect(1) // malformed payloads are never retried
        .mount(&server)
        .await;

    let err = executor
        .execute(&ApiRequest::get("/v1/ticker"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidData { .. }));
}

// ── Timeout ─────────────────────────────────────────────────────────

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = TransportConfig {
        timeout: Duration::from_millis(100),
        ..TransportConfig::default()
    };
    let executor = HttpExecutor::new(&transport, &server.uri(), RetryPolicy::none()).unwrap();

    let err = executor
        .execute(&ApiRequest::get("/v1/slow"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 100 }), "got: {err:?}");
}

// ── Probe ───────────────────────────────────────────────────────────

#[tokio::test]
async fn probe_reports_success_and_latency() {
    let (server, executor) = setup(RetryPolicy::none()).await;

    Mock::given(method("GET"))
        .and(path("/v1/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let report = executor.probe(&ApiRequest::get("/v1/ping")).await;

    assert!(report.success);
    assert_eq!(report.status, Some(200));
    assert!(report.error.is_none());
}

#[tokio::test]
async fn probe_folds_failure_into_report() {
    let (server, executor) = setup(RetryPolicy::none()).await;

    Mock::given(method("GET"))
        .and(path("/v1/ping"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let report = executor.probe(&ApiRequest::get("/v1/ping")).await;

    assert!(!report.success);
    assert_eq!(report.status, Some(500));
    assert_eq!(report.error.as_deref(), Some("Internal server error"));
}
