//! Liveness, metrics, and fallback behavior.
//!
//! Run with: cargo test -p transcription-service --test health_check

mod common;

use common::{spawn_app, test_settings};
use std::sync::Arc;
use std::time::Duration;
use transcription_service::services::providers::mock::MockVisionProvider;

#[tokio::test]
async fn health_check_returns_ok() {
    let provider = Arc::new(MockVisionProvider::replying("ok"));
    let app = spawn_app(test_settings(), provider).await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "OK");
    assert_eq!(body["service"], "transcription-service");
    assert_eq!(body["environment"], "test");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn health_check_is_also_served_under_api() {
    let provider = Arc::new(MockVisionProvider::replying("ok"));
    let app = spawn_app(test_settings(), provider).await;

    let response = app
        .client
        .get(format!("{}/api/health", app.address))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn unknown_routes_get_a_json_404() {
    let provider = Arc::new(MockVisionProvider::replying("ok"));
    let app = spawn_app(test_settings(), provider).await;

    let response = app
        .client
        .get(format!("{}/api/nao-existe", app.address))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Rota não encontrada");
}

#[tokio::test]
async fn responses_carry_security_headers_and_a_request_id() {
    let provider = Arc::new(MockVisionProvider::replying("ok"));
    let app = spawn_app(test_settings(), provider).await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .header("x-request-id", "req-integracao-1")
        .send()
        .await
        .expect("Failed to send request");

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-request-id").unwrap(), "req-integracao-1");
}

#[tokio::test]
async fn metrics_endpoint_exposes_request_counters() {
    let provider = Arc::new(MockVisionProvider::replying("ok"));
    let app = spawn_app(test_settings(), provider).await;

    app.client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to send request");

    let body = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .expect("Failed to send request")
        .text()
        .await
        .expect("Failed to read body");

    assert!(body.contains("http_requests_total"));
    assert!(body.contains("http_request_duration_seconds"));
}
