//! Shared helpers for integration tests.

use reqwest::Client;
use secrecy::Secret;
use std::sync::Arc;
use transcription_service::config::{
    AccessSettings, CorsSettings, OpenAiSettings, RateLimitSettings, Settings, UploadSettings,
};
use transcription_service::services::providers::VisionProvider;
use transcription_service::startup::Application;

pub struct TestApp {
    pub address: String,
    pub client: Client,
}

/// Settings bound to a random loopback port, with rate limits high
/// enough to stay out of the way. Tests that exercise limiting or
/// timeouts tighten the relevant fields themselves.
pub fn test_settings() -> Settings {
    Settings {
        server: service_core::config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
        },
        openai: OpenAiSettings {
            // The mock provider never dials out; these are inert.
            api_key: Secret::new("test-api-key".to_string()),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "gpt-4o".to_string(),
            timeout_secs: 30,
        },
        access: AccessSettings::default(),
        upload: UploadSettings::default(),
        rate_limit: RateLimitSettings {
            global_max: 10_000,
            global_window_secs: 900,
            transcribe_max: 1_000,
            transcribe_window_secs: 60,
        },
        cors: CorsSettings::default(),
    }
}

pub async fn spawn_app(settings: Settings, provider: Arc<dyn VisionProvider>) -> TestApp {
    let app = Application::with_provider(settings, provider)
        .await
        .expect("Failed to build application");
    let port = app.port();

    // Spawn the server in the background
    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build HTTP client");

    TestApp {
        address: format!("http://127.0.0.1:{port}"),
        client,
    }
}
