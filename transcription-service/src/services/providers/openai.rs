//! OpenAI vision provider implementation.
//!
//! Sends the prompt pair plus the image (as an inline data URL) to the
//! chat-completions endpoint and extracts the transcription text from
//! the first choice.

use super::{ProviderError, Transcription, TranscriptionParams, VisionProvider};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Slack added on top of the orchestration timeout so the caller's
/// `tokio::time::timeout` always fires before the HTTP client's own.
const CLIENT_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// OpenAI provider configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub model: String,
    pub timeout: Duration,
}

/// OpenAI-backed vision provider.
pub struct OpenAiVisionProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiVisionProvider {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout + CLIENT_TIMEOUT_SLACK)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl VisionProvider for OpenAiVisionProvider {
    async fn transcribe(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        image_url: &str,
        params: &TranscriptionParams,
    ) -> Result<Transcription, ProviderError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user_with_image(user_prompt, image_url),
            ],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        tracing::debug!(
            model = %self.config.model,
            image_url_len = image_url.len(),
            "Sending request to OpenAI API"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();

            if status == 429 {
                return Err(ProviderError::RateLimited);
            }

            let message = parse_error_message(&body).unwrap_or_else(|| truncated(&body));
            return Err(ProviderError::ApiError { status, message });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        extract_transcription(completion)
    }
}

/// Pull the transcription text out of the first choice.
fn extract_transcription(
    completion: ChatCompletionResponse,
) -> Result<Transcription, ProviderError> {
    let text = completion
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            ProviderError::InvalidResponse("response carried no message content".to_string())
        })?
        .to_string();

    Ok(Transcription {
        text,
        model: completion.model,
        usage: completion.usage,
    })
}

/// OpenAI error bodies look like `{"error": {"message": "..."}}`.
fn parse_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(|s| s.to_string())
}

fn truncated(body: &str) -> String {
    body.chars().take(300).collect()
}

// ============================================================================
// OpenAI API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

impl ChatMessage {
    fn system(text: &str) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.to_string()),
        }
    }

    fn user_with_image(text: &str, image_url: &str) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: text.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.to_string(),
                    },
                },
            ]),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<super::TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_prompts_and_image_parts() {
        let request = ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![
                ChatMessage::system("descreva imagens"),
                ChatMessage::user_with_image("transcreva", "data:image/png;base64,AAAA"),
            ],
            max_tokens: 500,
            temperature: 0.3,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["max_tokens"], 500);
        assert!((value["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], "descreva imagens");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"][0]["type"], "text");
        assert_eq!(value["messages"][1]["content"][0]["text"], "transcreva");
        assert_eq!(value["messages"][1]["content"][1]["type"], "image_url");
        assert_eq!(
            value["messages"][1]["content"][1]["image_url"]["url"],
            "data:image/png;base64,AAAA"
        );
    }

    #[test]
    fn extracts_and_trims_the_first_choice() {
        let completion: ChatCompletionResponse = serde_json::from_str(
            r#"{
                "id": "chatcmpl-123",
                "model": "gpt-4o-2024-08-06",
                "choices": [
                    {
                        "index": 0,
                        "message": {"role": "assistant", "content": "  venda de 1.234 unidades  "},
                        "finish_reason": "stop"
                    }
                ],
                "usage": {"prompt_tokens": 100, "completion_tokens": 25, "total_tokens": 125}
            }"#,
        )
        .unwrap();

        let transcription = extract_transcription(completion).unwrap();
        assert_eq!(transcription.text, "venda de 1.234 unidades");
        assert_eq!(transcription.model, "gpt-4o-2024-08-06");
        assert_eq!(transcription.usage.unwrap().total_tokens, 125);
    }

    #[test]
    fn empty_choices_are_an_invalid_response() {
        let completion: ChatCompletionResponse =
            serde_json::from_str(r#"{"model": "gpt-4o", "choices": []}"#).unwrap();
        assert!(matches!(
            extract_transcription(completion).unwrap_err(),
            ProviderError::InvalidResponse(_)
        ));
    }

    #[test]
    fn null_content_is_an_invalid_response() {
        let completion: ChatCompletionResponse = serde_json::from_str(
            r#"{"model": "gpt-4o", "choices": [{"message": {"content": null}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            extract_transcription(completion).unwrap_err(),
            ProviderError::InvalidResponse(_)
        ));
    }

    #[test]
    fn error_bodies_yield_the_nested_message() {
        let body = r#"{"error": {"message": "invalid api key", "type": "invalid_request_error"}}"#;
        assert_eq!(parse_error_message(body).unwrap(), "invalid api key");
        assert!(parse_error_message("<html>gateway error</html>").is_none());
    }
}
