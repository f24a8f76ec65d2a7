//! Google Gemini (text) and Imagen (images) client over the REST API.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::client::{AiClient, AiError};
use super::config::AiConfig;
use super::types::{ChatRequest, ChatResponse, ImageRequest, ImageResponse, Role, Usage};
use crate::types::GeneratedImage;

/// Gemini API client.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client from configuration. The transport timeout applies to every request.
    pub fn new(config: &AiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            client,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// POST a JSON body and return the raw response text, mapping HTTP failures.
    async fn post<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<String, AiError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(AiError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;

        if !(200..300).contains(&status) {
            if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(&body) {
                return Err(AiError::Api {
                    status,
                    message: error_response.error.message,
                });
            }
            return Err(AiError::Api {
                status,
                message: body,
            });
        }

        Ok(body)
    }

    fn build_generate_request(request: &ChatRequest) -> GenerateContentRequest {
        let mut contents = Vec::new();
        let mut system_parts = Vec::new();

        for message in &request.messages {
            let part = TextPart {
                text: message.content.clone(),
            };
            match message.role {
                // Gemini takes system text in a separate field
                Role::System => system_parts.push(part),
                Role::User => contents.push(Content {
                    role: Some("user".to_string()),
                    parts: vec![part],
                }),
            }
        }

        let system_instruction = (!system_parts.is_empty()).then(|| Content {
            role: None,
            parts: system_parts,
        });

        let generation_config = GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
            response_mime_type: request
                .response_schema
                .as_ref()
                .map(|_| "application/json".to_string()),
            response_schema: request.response_schema.clone(),
        };

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config,
        }
    }
}

/// Gemini generateContent request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<JsonValue>,
}

/// Gemini generateContent response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

/// Imagen predict request.
#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: &'static str,
    output_options: OutputOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions {
    mime_type: String,
}

/// Imagen predict response. Filtered samples come back without bytes.
#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiApiError {
    message: String,
}

/// Error response from the Gemini API.
#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiApiError,
}

fn extract_text(response: GenerateContentResponse) -> Result<ChatResponse, AiError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AiError::ParseError("No text content in response".to_string()));
    }

    let usage = response
        .usage_metadata
        .map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        })
        .unwrap_or_default();

    Ok(ChatResponse {
        content: text,
        usage,
        cached: false,
    })
}

fn extract_images(response: PredictResponse, default_mime: &str) -> Result<ImageResponse, AiError> {
    let mut images = Vec::new();
    for prediction in response.predictions {
        let Some(encoded) = prediction.bytes_base64_encoded else {
            continue;
        };
        let data = STANDARD
            .decode(encoded)
            .map_err(|e| AiError::ParseError(format!("Invalid image payload: {}", e)))?;
        let mime_type = prediction
            .mime_type
            .unwrap_or_else(|| default_mime.to_string());
        images.push(GeneratedImage::new(mime_type, data));
    }

    Ok(ImageResponse {
        images,
        cached: false,
    })
}

#[async_trait]
impl AiClient for GeminiClient {
    async fn complete(
        &self,
        prompt_name: &str,
        request: ChatRequest,
    ) -> Result<ChatResponse, AiError> {
        let url = self.endpoint(&self.text_model, "generateContent");
        let body = Self::build_generate_request(&request);

        tracing::debug!(
            prompt_name = prompt_name,
            model = %self.text_model,
            "Calling Gemini generateContent"
        );

        let text = self.post(&url, &body).await?;
        let response: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| AiError::ParseError(e.to_string()))?;

        extract_text(response)
    }

    async fn generate_images(
        &self,
        prompt_name: &str,
        request: ImageRequest,
    ) -> Result<ImageResponse, AiError> {
        let url = self.endpoint(&self.image_model, "predict");
        let body = PredictRequest {
            instances: vec![PredictInstance {
                prompt: request.prompt,
            }],
            parameters: PredictParameters {
                sample_count: request.count,
                aspect_ratio: request.aspect_ratio.as_str(),
                output_options: OutputOptions {
                    mime_type: request.mime_type.clone(),
                },
            },
        };

        tracing::debug!(
            prompt_name = prompt_name,
            model = %self.image_model,
            aspect_ratio = request.aspect_ratio.as_str(),
            "Calling Imagen predict"
        );

        let text = self.post(&url, &body).await?;
        let response: PredictResponse =
            serde_json::from_str(&text).map_err(|e| AiError::ParseError(e.to_string()))?;

        extract_images(response, &request.mime_type)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn text_model(&self) -> &str {
        &self.text_model
    }

    fn image_model(&self) -> &str {
        &self.image_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ChatMessage;
    use serde_json::json;

    #[test]
    fn test_system_messages_become_system_instruction() {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system("You are a creative chef."),
                ChatMessage::user("Use eggs."),
            ],
            response_schema: Some(json!({"type": "OBJECT"})),
            ..Default::default()
        };

        let body = serde_json::to_value(GeminiClient::build_generate_request(&request)).unwrap();
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a creative chef."
        );
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Use eggs.");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 4, "totalTokenCount": 7}
        }))
        .unwrap();

        let chat = extract_text(response).unwrap();
        assert_eq!(chat.content, "{\"a\":1}");
        assert_eq!(chat.usage.total_tokens, 7);
    }

    #[test]
    fn test_extract_text_empty_is_error() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": []})).unwrap();
        assert!(matches!(extract_text(response), Err(AiError::ParseError(_))));
    }

    #[test]
    fn test_extract_images_skips_filtered_samples() {
        let response: PredictResponse = serde_json::from_value(json!({
            "predictions": [
                {"raiFilteredReason": "blocked"},
                {"bytesBase64Encoded": "AQID", "mimeType": "image/png"}
            ]
        }))
        .unwrap();

        let images = extract_images(response, "image/png").unwrap();
        assert_eq!(images.images, vec![GeneratedImage::png(vec![1, 2, 3])]);
    }

    #[test]
    fn test_predict_request_shape() {
        let body = serde_json::to_value(PredictRequest {
            instances: vec![PredictInstance {
                prompt: "pancakes".to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: "16:9",
                output_options: OutputOptions {
                    mime_type: "image/png".to_string(),
                },
            },
        })
        .unwrap();

        assert_eq!(body["parameters"]["sampleCount"], 1);
        assert_eq!(body["parameters"]["aspectRatio"], "16:9");
        assert_eq!(body["parameters"]["outputOptions"]["mimeType"], "image/png");
    }
}
