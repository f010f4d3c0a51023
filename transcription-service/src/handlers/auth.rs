use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use tower_sessions::Session;

use crate::AppState;
use crate::dtos::auth::LoginRequest;
use service_core::error::AppError;

/// `POST /api/login`: validate the credentials and persist the session.
/// Nothing is stored when any check fails.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.gate.authenticate(&payload.email, &payload.name)?;
    state.gate.persist(&session, &user).await?;

    tracing::info!(email = %user.email, "User logged in");

    Ok(Json(json!({
        "success": true,
        "user": user,
    })))
}

/// `GET /api/session`: report whether a stored session is still valid.
pub async fn session_handler(
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    match state.gate.restore(&session).await {
        Some(user) => Json(json!({
            "authenticated": true,
            "user": user,
        })),
        None => Json(json!({
            "authenticated": false,
        })),
    }
}

/// `POST /api/logout`: drop everything stored for this caller.
pub async fn logout_handler(
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    state.gate.end(&session).await;

    tracing::info!("User logged out");

    Json(json!({ "success": true }))
}
