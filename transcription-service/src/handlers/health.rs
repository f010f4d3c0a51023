use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use serde_json::json;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "service": "transcription-service",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.settings.server.environment,
        "timestamp": Utc::now(),
    }))
}
