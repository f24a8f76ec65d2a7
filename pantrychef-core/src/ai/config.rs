//! AI configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for recipe text.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Default model for hero and step images.
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// Default transport timeout. Image requests routinely take tens of seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Which backend serves generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    /// Canned responses, no network. Useful for demos and offline work.
    Fake,
}

/// AI client configuration.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: ProviderKind,
    /// API key for Gemini. Empty for the fake provider.
    pub api_key: String,
    pub text_model: String,
    pub image_model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Directory for caching responses. None disables caching.
    pub cache_dir: Option<PathBuf>,
    /// If true, only use cache, error if not cached.
    pub offline: bool,
}

impl AiConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `PANTRYCHEF_AI_PROVIDER`: "gemini" (default) or "fake"
    /// - `GEMINI_API_KEY`: required when the provider is "gemini"
    /// - `PANTRYCHEF_TEXT_MODEL`: text model (default: "gemini-2.5-flash")
    /// - `PANTRYCHEF_IMAGE_MODEL`: image model (default: "imagen-4.0-generate-001")
    /// - `PANTRYCHEF_AI_BASE_URL`: API base URL
    /// - `PANTRYCHEF_AI_TIMEOUT_SECS`: transport timeout (default: 120)
    /// - `PANTRYCHEF_AI_CACHE_DIR`: cache directory (default: caching disabled)
    /// - `PANTRYCHEF_AI_OFFLINE`: use cache only (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = match env::var("PANTRYCHEF_AI_PROVIDER").as_deref() {
            Err(_) | Ok("gemini") => ProviderKind::Gemini,
            Ok("fake") => ProviderKind::Fake,
            Ok(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "PANTRYCHEF_AI_PROVIDER".to_string(),
                    value: other.to_string(),
                })
            }
        };

        let api_key = match provider {
            ProviderKind::Gemini => env::var("GEMINI_API_KEY")
                .map_err(|_| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?,
            ProviderKind::Fake => String::new(),
        };

        let text_model =
            env::var("PANTRYCHEF_TEXT_MODEL").unwrap_or_else(|_| DEFAULT_TEXT_MODEL.to_string());

        let image_model =
            env::var("PANTRYCHEF_IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string());

        let base_url =
            env::var("PANTRYCHEF_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout = match env::var("PANTRYCHEF_AI_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue {
                    name: "PANTRYCHEF_AI_TIMEOUT_SECS".to_string(),
                    value: v,
                })?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let cache_dir = env::var("PANTRYCHEF_AI_CACHE_DIR").ok().map(PathBuf::from);

        let offline = env::var("PANTRYCHEF_AI_OFFLINE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            provider,
            api_key,
            text_model,
            image_model,
            base_url,
            timeout,
            cache_dir,
            offline,
        })
    }

    /// Configuration for the fake provider with no caching.
    pub fn fake() -> Self {
        Self {
            provider: ProviderKind::Fake,
            api_key: String::new(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_dir: None,
            offline: false,
        }
    }

    /// Get the conventional cache directory: ~/.pantrychef/ai-cache
    pub fn default_cache_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".pantrychef").join("ai-cache"))
            .unwrap_or_else(|| PathBuf::from("data/ai-cache"))
    }
}
