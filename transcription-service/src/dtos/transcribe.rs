use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::providers::TokenUsage;

/// Body of `POST /api/transcribe-base64`. Identity fields are optional;
/// when absent the authenticated session supplies them.
#[derive(Debug, Deserialize, Validate)]
pub struct TranscribeBase64Request {
    /// Image as a `data:<mime>;base64,<payload>` URL. Older clients
    /// sent the field as `imageBase64`. A missing key deserializes as
    /// empty so the validator answers with the product message instead
    /// of a deserialization error.
    #[serde(default, alias = "imageBase64")]
    #[validate(length(min = 1, message = "Imagem em base64 não fornecida"))]
    pub image: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Identity a transcription ran under, echoed back in the response.
#[derive(Debug, Clone, Serialize)]
pub struct RequesterInfo {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub success: bool,
    pub transcription: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    pub user: RequesterInfo,
}
