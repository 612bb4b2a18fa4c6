//! Integration tests for the reqwest transport and the retrying
//! executor against a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tessera_core::Error;
use tessera_http::{
    CanonicalUri, ExecutorConfig, HttpMethod, HttpRequest, HttpTransport, ReqwestTransport,
    RequestExecutor,
};

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(Duration::from_secs(5)).unwrap()
}

fn get_request(server: &MockServer, target: &str) -> HttpRequest {
    HttpRequest::new(
        HttpMethod::Get,
        CanonicalUri::from_absolute(&format!("{}{target}", server.uri())).unwrap(),
    )
}

/// Executor with millisecond-scale backoff so retry tests stay fast.
fn fast_executor(transport: Arc<dyn HttpTransport>) -> RequestExecutor {
    let config = ExecutorConfig {
        max_retries: 4,
        max_delay_ms: 2,
        base_delay_ms: 1,
        throttling_base_ms: 1,
    };
    RequestExecutor::new(transport, &config)
}

#[tokio::test]
async fn test_transport_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants/current"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"name":"Acme"}"#),
        )
        .mount(&server)
        .await;

    let response = transport()
        .execute(
            &get_request(&server, "/v1/tenants/current"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body.as_deref(), Some(r#"{"name":"Acme"}"#));
}

#[tokio::test]
async fn test_transport_sends_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(201).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = HttpRequest::new(
        HttpMethod::Post,
        CanonicalUri::from_absolute(&format!("{}/v1/accounts", server.uri())).unwrap(),
    )
    .with_body(r#"{"email":"tk421@empire.gov"}"#);
    request.headers.set("Content-Type", "application/json");

    let response = transport()
        .execute(&request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn test_connection_failure_maps_to_transport_error() {
    // Nothing is listening on this port.
    let request = HttpRequest::new(
        HttpMethod::Get,
        CanonicalUri::from_absolute("http://127.0.0.1:9/v1/tenants/current").unwrap(),
    );
    let result = transport()
        .execute(&request, &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(Error::Transport { .. })));
}

#[tokio::test]
async fn test_executor_retries_server_errors_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(5) // 1 initial attempt + 4 retries
        .mount(&server)
        .await;

    let executor = fast_executor(Arc::new(transport()));
    let response = executor
        .execute(&get_request(&server, "/v1/flaky"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.status, 503);
}

#[tokio::test]
async fn test_executor_retries_throttled_responses_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/throttled"))
        .respond_with(ResponseTemplate::new(429))
        .expect(5)
        .mount(&server)
        .await;

    let executor = fast_executor(Arc::new(transport()));
    let response = executor
        .execute(
            &get_request(&server, "/v1/throttled"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(response.status, 429);
}

#[tokio::test]
async fn test_executor_does_not_retry_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let executor = fast_executor(Arc::new(transport()));
    let response = executor
        .execute(&get_request(&server, "/v1/gone"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_cancellation_aborts_inflight_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let child = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        child.cancel();
    });

    let executor = fast_executor(Arc::new(transport()));
    let result = executor
        .execute(&get_request(&server, "/v1/slow"), &cancel)
        .await;
    assert!(matches!(result, Err(Error::Cancelled)));
}
