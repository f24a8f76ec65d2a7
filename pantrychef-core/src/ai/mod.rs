//! AI client module for recipe and image generation.
//!
//! This module provides:
//! - `AiClient` trait for abstracting AI providers
//! - `GeminiClient` talking to Gemini (text) and Imagen (images)
//! - `CachingAiClient` decorator with disk-based caching
//! - `FakeAiClient` for tests and offline demos
//! - Configuration via environment variables
//! - Prompt templates
//!
//! # Configuration
//!
//! See [`AiConfig::from_env`] for the environment variables.
//!
//! # Example
//!
//! ```ignore
//! use pantrychef_core::ai::{create_client_from_env, ChatMessage, ChatRequest};
//!
//! let client = create_client_from_env()?;
//!
//! let request = ChatRequest {
//!     messages: vec![ChatMessage::user("Hello!")],
//!     ..Default::default()
//! };
//!
//! let response = client.complete("test", request).await?;
//! println!("Response: {}", response.content);
//! ```

mod cache;
mod caching;
mod client;
mod config;
mod fake;
mod gemini;
pub mod prompts;
mod types;

pub use cache::{AiCache, CacheKey, CacheStats, CachedAiResponse};
pub use caching::CachingAiClient;
pub use client::{create_client, create_client_from_env, AiClient, AiError};
pub use config::{AiConfig, ConfigError, ProviderKind};
pub use fake::{FakeAiClient, FakeCall};
pub use gemini::GeminiClient;
pub use types::{
    AspectRatio, ChatMessage, ChatRequest, ChatResponse, ImageRequest, ImageResponse, Role, Usage,
};
