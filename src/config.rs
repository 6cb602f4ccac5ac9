use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_FILE_POLL_TIMEOUT_SECS: u64 = 120;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Mosaic server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// API key used to authenticate against the Gemini API.
    pub gemini_api_key: String,
    /// Model identifier passed to every generation call.
    pub gemini_model: String,
    /// Base URL of the Gemini API (overridable for proxies and tests).
    pub gemini_base_url: String,
    /// Origin of the frontend allowed to call this server.
    pub frontend_url: String,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Deadline, in seconds, for remote file processing to finish.
    pub file_poll_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            gemini_api_key: load_env("GEMINI_API_KEY")?,
            gemini_model: load_env_optional("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: load_env_optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            frontend_url: load_env_optional("FRONTEND_URL")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
            file_poll_timeout_secs: load_env_optional("FILE_POLL_TIMEOUT_SECS")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("FILE_POLL_TIMEOUT_SECS".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_FILE_POLL_TIMEOUT_SECS),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
///
/// A missing `GEMINI_API_KEY` is fatal here, before the server binds.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        model = %config.gemini_model,
        base_url = %config.gemini_base_url,
        frontend_url = %config.frontend_url,
        server_port = ?config.server_port,
        poll_timeout_secs = config.file_poll_timeout_secs,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
