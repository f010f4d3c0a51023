//! Login, session restore, and logout flows.
//!
//! Run with: cargo test -p transcription-service --test session_test

mod common;

use common::{TestApp, spawn_app, test_settings};
use serde_json::json;
use std::sync::Arc;
use transcription_service::services::providers::mock::MockVisionProvider;

async fn app() -> TestApp {
    let provider = Arc::new(MockVisionProvider::replying("texto"));
    spawn_app(test_settings(), provider).await
}

async fn login(app: &TestApp, email: &str, name: &str) -> reqwest::Response {
    app.client
        .post(format!("{}/api/login", app.address))
        .json(&json!({ "email": email, "name": name }))
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
async fn login_with_corporate_email_succeeds() {
    let app = app().await;

    let response = login(&app, "ana.souza@g.globo", "Ana Souza").await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "ana.souza@g.globo");
    assert_eq!(body["user"]["name"], "Ana Souza");
    assert!(body["user"]["loginTime"].is_string());
}

#[tokio::test]
async fn session_survives_a_new_request() {
    let app = app().await;
    login(&app, "ana@g.globo", "Ana").await;

    let response = app
        .client
        .get(format!("{}/api/session", app.address))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["email"], "ana@g.globo");
}

#[tokio::test]
async fn login_outside_the_domain_is_rejected_and_leaves_no_session() {
    let app = app().await;

    let response = login(&app, "ana@gmail.com", "Ana").await;
    assert_eq!(response.status(), 403);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Acesso negado"));

    let session: serde_json::Value = app
        .client
        .get(format!("{}/api/session", app.address))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(session["authenticated"], false);
}

#[tokio::test]
async fn malformed_emails_are_rejected() {
    let app = app().await;

    for email in ["nao-e-email", "dois@@g.globo", "a@b"] {
        let response = login(&app, email, "Ana").await;
        assert_eq!(response.status(), 400, "{email} should be rejected");
    }
}

#[tokio::test]
async fn single_character_names_are_rejected() {
    let app = app().await;

    let response = login(&app, "ana@g.globo", "A").await;
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["error"].as_str().unwrap().contains("2 caracteres"));
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let app = app().await;

    let response = app
        .client
        .post(format!("{}/api/login", app.address))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["error"].as_str().unwrap().contains("preencha todos os campos"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = app().await;
    login(&app, "ana@g.globo", "Ana").await;

    let response = app
        .client
        .post(format!("{}/api/logout", app.address))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let session: serde_json::Value = app
        .client
        .get(format!("{}/api/session", app.address))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(session["authenticated"], false);
}
