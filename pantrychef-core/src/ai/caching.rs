//! Caching wrapper for AI clients.
//!
//! Wraps any AiClient to cache responses on disk. Same request to the same
//! model always returns the same cached response, which keeps development
//! runs cheap and makes offline replays possible.

use std::path::PathBuf;

use async_trait::async_trait;

use super::cache::{AiCache, CacheKey, CacheStats};
use super::client::{AiClient, AiError};
use super::types::{ChatRequest, ChatResponse, ImageRequest, ImageResponse};

pub struct CachingAiClient {
    inner: Box<dyn AiClient>,
    cache: AiCache,
    offline: bool,
}

impl CachingAiClient {
    /// Wrap `inner`. In offline mode a cache miss is an error instead of a network call.
    pub fn new(inner: Box<dyn AiClient>, cache_dir: PathBuf, offline: bool) -> Self {
        let cache = AiCache::new(cache_dir.join(inner.provider_name()));
        Self {
            inner,
            cache,
            offline,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[async_trait]
impl AiClient for CachingAiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError> {
        let key = CacheKey::new(prompt_name, self.inner.text_model(), &request);

        if let Some(cached) = self.cache.get::<ChatResponse>(&key) {
            tracing::debug!(prompt_name = prompt_name, "AI response found in cache");
            return Ok(ChatResponse {
                cached: true,
                ..cached.response
            });
        }

        if self.offline {
            return Err(AiError::OfflineNotCached);
        }

        let response = self.inner.complete(prompt_name, request).await?;

        // Best-effort: a failed write only costs a future cache miss
        if let Err(e) = self.cache.put(&key, &response) {
            tracing::warn!(error = %e, "Failed to cache AI response");
        }

        Ok(response)
    }

    async fn generate_images(
        &self,
        prompt_name: &str,
        request: ImageRequest,
    ) -> Result<ImageResponse, AiError> {
        let key = CacheKey::new(prompt_name, self.inner.image_model(), &request);

        if let Some(cached) = self.cache.get::<ImageResponse>(&key) {
            tracing::debug!(prompt_name = prompt_name, "AI images found in cache");
            return Ok(ImageResponse {
                cached: true,
                ..cached.response
            });
        }

        if self.offline {
            return Err(AiError::OfflineNotCached);
        }

        let response = self.inner.generate_images(prompt_name, request).await?;

        // Empty responses are not cached so a later run can retry the prompt
        if !response.images.is_empty() {
            if let Err(e) = self.cache.put(&key, &response) {
                tracing::warn!(error = %e, "Failed to cache AI images");
            }
        }

        Ok(response)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn text_model(&self) -> &str {
        self.inner.text_model()
    }

    fn image_model(&self) -> &str {
        self.inner.image_model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AspectRatio, ChatMessage, FakeAiClient};
    use crate::types::GeneratedImage;
    use tempfile::TempDir;

    fn chat(prompt: &str) -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage::user(prompt)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_caching_client() {
        let temp_dir = TempDir::new().unwrap();
        let fake = FakeAiClient::new().with_text("hello", "world");
        let client = CachingAiClient::new(Box::new(fake), temp_dir.path().to_path_buf(), false);

        let first = client.complete("greeting", chat("hello there")).await.unwrap();
        assert_eq!(first.content, "world");
        assert!(!first.cached);

        let second = client.complete("greeting", chat("hello there")).await.unwrap();
        assert_eq!(second.content, "world");
        assert!(second.cached);

        assert_eq!(client.cache_stats().cached_responses, 1);
    }

    #[tokio::test]
    async fn test_images_cached_but_not_empty_responses() {
        let temp_dir = TempDir::new().unwrap();
        let fake = FakeAiClient::new()
            .with_image("pancakes", GeneratedImage::png(vec![9]))
            .with_empty_image("waffles");
        let client = CachingAiClient::new(Box::new(fake), temp_dir.path().to_path_buf(), false);

        let request = ImageRequest::single_png("pancakes", AspectRatio::Landscape16x9);
        client.generate_images("hero", request.clone()).await.unwrap();
        let cached = client.generate_images("hero", request).await.unwrap();
        assert!(cached.cached);
        assert_eq!(cached.images, vec![GeneratedImage::png(vec![9])]);

        let empty = ImageRequest::single_png("waffles", AspectRatio::Landscape16x9);
        client.generate_images("hero", empty).await.unwrap();
        assert_eq!(client.cache_stats().cached_responses, 1);
    }

    #[tokio::test]
    async fn test_offline_miss_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let fake = FakeAiClient::new().with_text("hello", "world");
        let client = CachingAiClient::new(Box::new(fake), temp_dir.path().to_path_buf(), true);

        let result = client.complete("greeting", chat("hello")).await;
        assert!(matches!(result, Err(AiError::OfflineNotCached)));
    }
}
