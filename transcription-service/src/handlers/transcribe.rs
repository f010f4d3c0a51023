use axum::{
    Json,
    extract::{Multipart, State},
};
use tokio::time::timeout;
use tower_sessions::Session;
use validator::Validate;

use crate::AppState;
use crate::dtos::transcribe::{RequesterInfo, TranscribeBase64Request, TranscribeResponse};
use crate::services::image::ImagePayload;
use crate::services::metrics::record_transcription;
use crate::services::prompt;
use crate::services::providers::TranscriptionParams;
use service_core::error::AppError;

/// `POST /api/transcribe`: multipart upload with an `image` file part
/// and optional `email`/`name` text parts.
pub async fn transcribe_handler(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, AppError> {
    let mut image: Option<ImagePayload> = None;
    let mut email: Option<String> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Upload inválido: {e}")))?
    {
        match field.name() {
            Some("image") => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Upload inválido: {e}")))?;
                image = Some(ImagePayload::new(mime_type, bytes.to_vec()));
            }
            Some("email") => {
                email = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Upload inválido: {e}"))
                })?);
            }
            Some("name") => {
                name = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Upload inválido: {e}"))
                })?);
            }
            _ => {}
        }
    }

    let image = image
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Nenhuma imagem fornecida")))?;
    let requester = resolve_requester(&state, &session, email, name).await?;

    run_transcription(&state, image, requester).await
}

/// `POST /api/transcribe-base64`: JSON body carrying the image as a
/// data URL. The decoded bytes go through the same checks as a file
/// upload.
pub async fn transcribe_base64_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<TranscribeBase64Request>,
) -> Result<Json<TranscribeResponse>, AppError> {
    payload.validate()?;

    let image = ImagePayload::from_data_url(&payload.image)?;
    let requester = resolve_requester(&state, &session, payload.email, payload.name).await?;

    run_transcription(&state, image, requester).await
}

/// Work out who is asking. Explicit request fields win; an
/// authenticated session is the fallback. Either way the identity is
/// validated against the domain policy here, on every request, so a
/// spoofed client cannot smuggle an outside address through.
async fn resolve_requester(
    state: &AppState,
    session: &Session,
    email: Option<String>,
    name: Option<String>,
) -> Result<RequesterInfo, AppError> {
    let provided = match (email, name) {
        (Some(email), Some(name))
            if !email.trim().is_empty() && !name.trim().is_empty() =>
        {
            Some((email, name))
        }
        _ => None,
    };

    let (email, name) = match provided {
        Some(pair) => pair,
        None => match state.gate.restore(session).await {
            Some(user) => (user.email, user.name),
            None => {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "Informe email e nome, ou faça login antes de transcrever"
                )));
            }
        },
    };

    let (email, name) = state.gate.validate_credentials(&email, &name)?;
    Ok(RequesterInfo { email, name })
}

async fn run_transcription(
    state: &AppState,
    image: ImagePayload,
    requester: RequesterInfo,
) -> Result<Json<TranscribeResponse>, AppError> {
    image.ensure_acceptable(state.settings.upload.max_image_bytes)?;

    let data_url = image.to_data_url();
    let params = TranscriptionParams::default();
    let upstream_timeout = state.settings.openai.timeout();

    tracing::info!(
        email = %requester.email,
        mime_type = %image.mime_type,
        image_bytes = image.bytes.len(),
        "Forwarding image for transcription"
    );

    let transcription = match timeout(
        upstream_timeout,
        state.vision_provider.transcribe(
            prompt::SYSTEM_PROMPT,
            prompt::TRANSCRIPTION_PROMPT,
            &data_url,
            &params,
        ),
    )
    .await
    {
        Err(_) => {
            record_transcription("timeout");
            tracing::warn!(
                timeout_secs = upstream_timeout.as_secs(),
                "Upstream transcription call timed out"
            );
            return Err(AppError::UpstreamTimeout(upstream_timeout.as_secs()));
        }
        Ok(Err(err)) => {
            record_transcription("upstream_error");
            tracing::error!(error = %err, "Transcription provider call failed");
            return Err(err.into());
        }
        Ok(Ok(transcription)) => transcription,
    };

    record_transcription("success");
    tracing::info!(
        model = %transcription.model,
        chars = transcription.text.len(),
        "Transcription produced"
    );

    Ok(Json(TranscribeResponse {
        success: true,
        transcription: transcription.text,
        model: transcription.model,
        usage: transcription.usage,
        user: requester,
    }))
}
