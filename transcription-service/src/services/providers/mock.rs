//! Mock provider implementation for testing.

use super::{ProviderError, TokenUsage, Transcription, TranscriptionParams, VisionProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock vision provider with a canned reply, an optional artificial
/// delay, and an invocation counter so tests can assert whether the
/// upstream call was ever reached.
pub struct MockVisionProvider {
    reply: Result<String, ProviderError>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockVisionProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            reply: Err(error),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// How many times `transcribe` has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn transcribe(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _image_url: &str,
        _params: &TranscriptionParams,
    ) -> Result<Transcription, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.reply {
            Ok(text) => Ok(Transcription {
                text: text.clone(),
                model: "mock-vision".to_string(),
                usage: Some(TokenUsage {
                    prompt_tokens: 120,
                    completion_tokens: text.len() as u32 / 4,
                    total_tokens: 120 + text.len() as u32 / 4,
                }),
            }),
            Err(error) => Err(error.clone()),
        }
    }
}
