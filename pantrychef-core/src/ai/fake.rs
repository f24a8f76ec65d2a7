//! Fake AI client for testing.
//!
//! This client returns deterministic responses based on prompt matching,
//! allowing tests (and offline demos) to run without network access or API costs.

use std::sync::Mutex;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};

use super::client::{AiClient, AiError};
use super::types::{ChatRequest, ChatResponse, ImageRequest, ImageResponse, Usage};
use crate::types::GeneratedImage;

/// 1x1 transparent PNG used by the demo responses.
const PLACEHOLDER_PNG_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

const DEMO_RECIPE: &str = r#"{
    "recipeName": "Simple Pancakes",
    "description": "Light, fluffy pancakes made from pantry basics.",
    "prepTime": "5 minutes",
    "cookTime": "15 minutes",
    "servings": "2 servings",
    "ingredients": ["3 eggs", "1 cup flour", "1/2 cup milk", "1 pinch salt"],
    "instructions": [
        "Whisk the eggs and milk together in a bowl.",
        "Fold in the flour and salt until just combined.",
        "Cook ladlefuls of batter in a hot oiled pan until golden on both sides."
    ]
}"#;

/// What the fake does when a prompt matches.
#[derive(Debug, Clone)]
enum Reply<T> {
    Ok(T),
    Error(String),
    Panic(String),
}

/// A request the fake received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCall {
    pub prompt_name: String,
    pub prompt: String,
}

/// A fake AI client for testing.
///
/// Replies are matched by checking whether the prompt contains a registered
/// substring (case-insensitive); the first registered match wins. Unmatched
/// prompts fall back to the default reply, or fail if there is none.
#[derive(Debug, Default)]
pub struct FakeAiClient {
    text: Vec<(String, Reply<String>)>,
    images: Vec<(String, Reply<Vec<GeneratedImage>>)>,
    default_text: Option<String>,
    default_image: Option<GeneratedImage>,
    calls: Mutex<Vec<FakeCall>>,
}

impl FakeAiClient {
    /// Create a fake with no registered replies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `response` to text prompts containing `prompt_contains`.
    pub fn with_text(mut self, prompt_contains: &str, response: &str) -> Self {
        self.text
            .push((prompt_contains.to_lowercase(), Reply::Ok(response.to_string())));
        self
    }

    /// Fail text prompts containing `prompt_contains`.
    pub fn with_text_error(mut self, prompt_contains: &str, message: &str) -> Self {
        self.text
            .push((prompt_contains.to_lowercase(), Reply::Error(message.to_string())));
        self
    }

    /// Panic on text prompts containing `prompt_contains`.
    pub fn with_text_panic(mut self, prompt_contains: &str) -> Self {
        self.text.push((
            prompt_contains.to_lowercase(),
            Reply::Panic(format!("FakeAiClient: panic on {}", prompt_contains)),
        ));
        self
    }

    /// Reply with `image` to image prompts containing `prompt_contains`.
    pub fn with_image(mut self, prompt_contains: &str, image: GeneratedImage) -> Self {
        self.images
            .push((prompt_contains.to_lowercase(), Reply::Ok(vec![image])));
        self
    }

    /// Reply with an empty image set to prompts containing `prompt_contains`.
    pub fn with_empty_image(mut self, prompt_contains: &str) -> Self {
        self.images
            .push((prompt_contains.to_lowercase(), Reply::Ok(Vec::new())));
        self
    }

    /// Fail image prompts containing `prompt_contains`.
    pub fn with_image_error(mut self, prompt_contains: &str, message: &str) -> Self {
        self.images
            .push((prompt_contains.to_lowercase(), Reply::Error(message.to_string())));
        self
    }

    /// Panic on image prompts containing `prompt_contains`.
    pub fn with_image_panic(mut self, prompt_contains: &str) -> Self {
        self.images.push((
            prompt_contains.to_lowercase(),
            Reply::Panic(format!("FakeAiClient: panic on {}", prompt_contains)),
        ));
        self
    }

    /// Text reply for prompts that match nothing.
    pub fn with_default_text(mut self, response: &str) -> Self {
        self.default_text = Some(response.to_string());
        self
    }

    /// Image reply for prompts that match nothing.
    pub fn with_default_image(mut self, image: GeneratedImage) -> Self {
        self.default_image = Some(image);
        self
    }

    /// A fake that answers every prompt with a pancake recipe and placeholder images.
    pub fn with_demo_responses() -> Self {
        let placeholder = STANDARD.decode(PLACEHOLDER_PNG_B64).unwrap_or_default();
        Self::new()
            .with_default_text(DEMO_RECIPE)
            .with_default_image(GeneratedImage::png(placeholder))
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn record(&self, prompt_name: &str, prompt: &str) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(FakeCall {
                prompt_name: prompt_name.to_string(),
                prompt: prompt.to_string(),
            });
    }
}

fn find_reply<'a, T>(replies: &'a [(String, Reply<T>)], prompt: &str) -> Option<&'a Reply<T>> {
    let prompt_lower = prompt.to_lowercase();
    replies
        .iter()
        .find(|(pattern, _)| prompt_lower.contains(pattern.as_str()))
        .map(|(_, reply)| reply)
}

fn no_reply(prompt: &str) -> AiError {
    AiError::RequestFailed(format!(
        "FakeAiClient: No response configured for prompt (first 100 chars): {}",
        prompt.chars().take(100).collect::<String>()
    ))
}

#[async_trait]
impl AiClient for FakeAiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError> {
        let prompt = request.prompt_text();
        self.record(prompt_name, &prompt);

        let content = match find_reply(&self.text, &prompt) {
            Some(Reply::Ok(text)) => text.clone(),
            Some(Reply::Error(message)) => return Err(AiError::RequestFailed(message.clone())),
            Some(Reply::Panic(message)) => panic!("{}", message),
            None => self.default_text.clone().ok_or_else(|| no_reply(&prompt))?,
        };

        Ok(ChatResponse {
            content,
            usage: Usage::default(),
            cached: false,
        })
    }

    async fn generate_images(
        &self,
        prompt_name: &str,
        request: ImageRequest,
    ) -> Result<ImageResponse, AiError> {
        self.record(prompt_name, &request.prompt);

        let images = match find_reply(&self.images, &request.prompt) {
            Some(Reply::Ok(images)) => images.clone(),
            Some(Reply::Error(message)) => return Err(AiError::RequestFailed(message.clone())),
            Some(Reply::Panic(message)) => panic!("{}", message),
            None => vec![self
                .default_image
                .clone()
                .ok_or_else(|| no_reply(&request.prompt))?],
        };

        Ok(ImageResponse {
            images,
            cached: false,
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn text_model(&self) -> &str {
        "fake-text-model"
    }

    fn image_model(&self) -> &str {
        "fake-image-model"
    }
}
