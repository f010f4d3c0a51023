use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Upstream error: {message}")]
    UpstreamError {
        status: Option<u16>,
        message: String,
    },

    #[error("Upstream timeout after {0}s")]
    UpstreamTimeout(u64),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            success: bool,
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details, retry_after) = match self {
            AppError::ValidationError(err) => (
                StatusCode::BAD_REQUEST,
                "Dados inválidos".to_string(),
                Some(err.to_string()),
                None,
            ),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None, None),
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), None, None),
            AppError::DomainNotAllowed(msg) => (StatusCode::FORBIDDEN, msg, None, None),
            AppError::TooManyRequests(msg, retry) => {
                (StatusCode::TOO_MANY_REQUESTS, msg, None, retry)
            }
            AppError::PayloadTooLarge(msg) => (StatusCode::BAD_REQUEST, msg, None, None),
            AppError::UnsupportedMediaType(msg) => (StatusCode::BAD_REQUEST, msg, None, None),
            AppError::UpstreamError { status, message } => (
                StatusCode::BAD_GATEWAY,
                "Erro ao gerar transcrição".to_string(),
                Some(match status {
                    Some(code) => format!("upstream status {code}: {message}"),
                    None => message,
                }),
                None,
            ),
            AppError::UpstreamTimeout(secs) => (
                StatusCode::GATEWAY_TIMEOUT,
                "Timeout na requisição".to_string(),
                Some(format!("sem resposta do provedor após {secs}s")),
                None,
            ),
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erro interno do servidor".to_string(),
                    None,
                    None,
                )
            }
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
                None,
            ),
        };

        let mut res = (
            status,
            Json(ErrorResponse {
                success: false,
                error: error_message,
                details,
            }),
        )
            .into_response();

        if let Some(retry) = retry_after {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        res
    }
}
