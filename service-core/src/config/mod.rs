use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Base server settings shared by every service. Flattened into each
/// service's own settings struct so the keys stay top-level
/// (`APP_PORT`, `APP_HOST`, `APP_ENVIRONMENT`).
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "development".to_string()
}

/// Layered configuration loading: an optional `configuration` file,
/// overridden by `APP_`-prefixed environment variables. Nested sections
/// use `__` (`APP_OPENAI__API_KEY` maps to `openai.api_key`).
pub fn load<T: DeserializeOwned>() -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let config = Cfg::builder()
        .add_source(File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins"),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}
