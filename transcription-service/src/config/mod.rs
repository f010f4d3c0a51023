use secrecy::Secret;
use serde::Deserialize;
use service_core::error::AppError;
use std::time::Duration;

/// Full service settings. Loaded from the optional `configuration` file
/// plus `APP_`-prefixed environment variables; the OpenAI API key must
/// come from the environment (`APP_OPENAI__API_KEY`) and is never
/// written into source or config files.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(flatten)]
    pub server: service_core::config::ServerConfig,
    pub openai: OpenAiSettings,
    #[serde(default)]
    pub access: AccessSettings,
    #[serde(default)]
    pub upload: UploadSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub cors: CorsSettings,
}

impl Settings {
    pub fn load() -> Result<Self, AppError> {
        service_core::config::load()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiSettings {
    pub api_key: Secret<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl OpenAiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccessSettings {
    /// Email suffix an address must carry to use the tool.
    #[serde(default = "default_allowed_domain")]
    pub allowed_domain: String,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            allowed_domain: default_allowed_domain(),
        }
    }
}

fn default_allowed_domain() -> String {
    "@g.globo".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadSettings {
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl UploadSettings {
    /// Transport-level body cap. Twice the image ceiling plus fixed
    /// slack covers base64 inflation and multipart framing; the handler
    /// still applies the exact ceiling to the decoded bytes.
    pub fn body_limit_bytes(&self) -> usize {
        self.max_image_bytes
            .saturating_mul(2)
            .saturating_add(64 * 1024)
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitSettings {
    /// Every route shares this budget, keyed by client IP.
    #[serde(default = "default_global_max")]
    pub global_max: u32,
    #[serde(default = "default_global_window_secs")]
    pub global_window_secs: u64,
    /// Tighter budget just for the transcription routes.
    #[serde(default = "default_transcribe_max")]
    pub transcribe_max: u32,
    #[serde(default = "default_transcribe_window_secs")]
    pub transcribe_window_secs: u64,
}

impl RateLimitSettings {
    pub fn global_window(&self) -> Duration {
        Duration::from_secs(self.global_window_secs)
    }

    pub fn transcribe_window(&self) -> Duration {
        Duration::from_secs(self.transcribe_window_secs)
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            global_max: default_global_max(),
            global_window_secs: default_global_window_secs(),
            transcribe_max: default_transcribe_max(),
            transcribe_window_secs: default_transcribe_window_secs(),
        }
    }
}

fn default_global_max() -> u32 {
    100
}

fn default_global_window_secs() -> u64 {
    15 * 60
}

fn default_transcribe_max() -> u32 {
    10
}

fn default_transcribe_window_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsSettings {
    /// `*` opens the API to any origin; anything else is matched exactly.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}
