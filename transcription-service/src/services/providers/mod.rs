//! Vision provider abstractions and implementations.
//!
//! This module provides a trait-based abstraction over the upstream
//! vision-language API, allowing the HTTP layer to swap between the
//! real OpenAI backend and a mock.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::ApiError { status, message } => AppError::UpstreamError {
                status: Some(status),
                message,
            },
            ProviderError::RateLimited => AppError::UpstreamError {
                status: Some(429),
                message: "rate limited by the upstream API".to_string(),
            },
            ProviderError::NetworkError(message) => AppError::UpstreamError {
                status: None,
                message,
            },
            ProviderError::InvalidResponse(message) => AppError::UpstreamError {
                status: None,
                message,
            },
            ProviderError::NotConfigured(message) => {
                AppError::InternalError(anyhow::anyhow!(message))
            }
        }
    }
}

/// Token accounting as reported by the upstream API, passed through to
/// clients unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A finished transcription.
#[derive(Debug, Clone)]
pub struct Transcription {
    /// Plain running prose describing the image.
    pub text: String,
    /// Model that actually answered, as reported upstream.
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// Sampling knobs for a transcription call.
#[derive(Debug, Clone, Copy)]
pub struct TranscriptionParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for TranscriptionParams {
    /// Bounded output and low temperature: transcriptions should be
    /// short, deterministic prose, not creative writing.
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.3,
        }
    }
}

/// Trait for image transcription providers.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Describe the image reachable at `image_url` (a data URL in
    /// practice) following the given prompt pair.
    async fn transcribe(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        image_url: &str,
        params: &TranscriptionParams,
    ) -> Result<Transcription, ProviderError>;
}
