use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use service_core::error::AppError;

/// MIME types the vision model accepts. Everything else is refused
/// before any upstream call is made.
pub const ALLOWED_IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// An uploaded image with its declared MIME type. The bytes are never
/// sniffed; the declared type is what gets validated and forwarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn mime_allowed(mime_type: &str) -> bool {
        let lowered = mime_type.to_ascii_lowercase();
        ALLOWED_IMAGE_TYPES.contains(&lowered.as_str())
    }

    /// MIME allowlist and size ceiling, in that order. Runs before the
    /// image is forwarded anywhere.
    pub fn ensure_acceptable(&self, max_bytes: usize) -> Result<(), AppError> {
        if !Self::mime_allowed(&self.mime_type) {
            return Err(AppError::UnsupportedMediaType(
                "Tipo de arquivo não suportado. Use JPEG, PNG, GIF ou WebP.".to_string(),
            ));
        }
        if self.bytes.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Arquivo muito grande. Máximo {}MB.",
                max_bytes / (1024 * 1024)
            )));
        }
        Ok(())
    }

    /// Inline `data:` URL, the form the chat-completions API expects
    /// for image content.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            BASE64.encode(&self.bytes)
        )
    }

    /// Parse a `data:<mime>;base64,<payload>` URL back into bytes.
    pub fn from_data_url(url: &str) -> Result<Self, AppError> {
        let rest = url.strip_prefix("data:").ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Imagem deve ser uma data URL (data:<tipo>;base64,...)"
            ))
        })?;

        let (mime_type, encoded) = rest.split_once(";base64,").ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Imagem deve ser uma data URL (data:<tipo>;base64,...)"
            ))
        })?;

        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Base64 inválido: {e}")))?;

        Ok(Self::new(mime_type, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn allowlist_covers_the_usual_suspects() {
        for mime in ALLOWED_IMAGE_TYPES {
            assert!(ImagePayload::mime_allowed(mime));
        }
        assert!(ImagePayload::mime_allowed("IMAGE/PNG"));
        assert!(!ImagePayload::mime_allowed("application/pdf"));
        assert!(!ImagePayload::mime_allowed("image/svg+xml"));
        assert!(!ImagePayload::mime_allowed("text/plain"));
    }

    #[test]
    fn pdf_is_rejected_as_unsupported() {
        let payload = ImagePayload::new("application/pdf", vec![1, 2, 3]);
        let err = payload.ensure_acceptable(1024).unwrap_err();
        assert_eq!(
            err.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn ceiling_is_inclusive() {
        let at_limit = ImagePayload::new("image/png", vec![0; 64]);
        assert!(at_limit.ensure_acceptable(64).is_ok());

        let over = ImagePayload::new("image/png", vec![0; 65]);
        assert!(matches!(
            over.ensure_acceptable(64).unwrap_err(),
            AppError::PayloadTooLarge(_)
        ));
    }

    #[test]
    fn mime_is_checked_before_size() {
        let payload = ImagePayload::new("application/pdf", vec![0; 65]);
        assert!(matches!(
            payload.ensure_acceptable(64).unwrap_err(),
            AppError::UnsupportedMediaType(_)
        ));
    }

    #[test]
    fn data_url_round_trips() {
        let payload = ImagePayload::new("image/png", b"fake png bytes".to_vec());
        let parsed = ImagePayload::from_data_url(&payload.to_data_url()).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn rejects_non_data_urls() {
        assert!(ImagePayload::from_data_url("https://example.com/a.png").is_err());
        assert!(ImagePayload::from_data_url("image/png;base64,AAAA").is_err());
    }

    #[test]
    fn rejects_data_urls_without_base64_marker() {
        assert!(ImagePayload::from_data_url("data:image/png,plain").is_err());
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(ImagePayload::from_data_url("data:image/png;base64,not!!valid??").is_err());
    }
}
