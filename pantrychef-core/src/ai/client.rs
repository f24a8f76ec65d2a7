//! AI client trait and construction from configuration.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::caching::CachingAiClient;
use super::config::{AiConfig, ProviderKind};
use super::fake::FakeAiClient;
use super::gemini::GeminiClient;
use super::types::{ChatRequest, ChatResponse, ImageRequest, ImageResponse};

#[derive(Error, Debug)]
pub enum AiError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Response not in cache and offline mode is enabled")]
    OfflineNotCached,

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}

/// Trait for AI clients.
///
/// Implementations must be thread-safe; the generation client issues several
/// image requests against the same client concurrently.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Complete a text request.
    ///
    /// The `prompt_name` is used for cache organization and logging.
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError>;

    /// Generate images for a prompt.
    async fn generate_images(
        &self,
        prompt_name: &str,
        request: ImageRequest,
    ) -> Result<ImageResponse, AiError>;

    /// Get the provider name (e.g., "gemini", "fake").
    fn provider_name(&self) -> &'static str;

    /// Model used for text requests.
    fn text_model(&self) -> &str;

    /// Model used for image requests.
    fn image_model(&self) -> &str;
}

/// Build the client described by `config`, wrapped in a disk cache when one is configured.
pub fn create_client(config: &AiConfig) -> Result<Arc<dyn AiClient>, AiError> {
    let inner: Box<dyn AiClient> = match config.provider {
        ProviderKind::Gemini => Box::new(
            GeminiClient::new(config).map_err(|e| AiError::RequestFailed(e.to_string()))?,
        ),
        ProviderKind::Fake => Box::new(FakeAiClient::with_demo_responses()),
    };

    match &config.cache_dir {
        Some(dir) => {
            tracing::debug!(
                cache_dir = %dir.display(),
                offline = config.offline,
                "AI response cache enabled"
            );
            Ok(Arc::new(CachingAiClient::new(inner, dir.clone(), config.offline)))
        }
        None if config.offline => Err(AiError::Config(
            super::config::ConfigError::MissingEnvVar("PANTRYCHEF_AI_CACHE_DIR".to_string()),
        )),
        None => Ok(Arc::from(inner)),
    }
}

/// Build a client from environment configuration.
pub fn create_client_from_env() -> Result<Arc<dyn AiClient>, AiError> {
    let config = AiConfig::from_env()?;
    create_client(&config)
}
