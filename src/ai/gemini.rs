//! Gemini structured-generation client
//!
//! Calls `models/{model}:generateContent` with inline base64 images and an
//! optional response schema. Serves OCR, analysis fallback, chat fallback and
//! image-bearing chat turns.

use super::credentials::ProviderKind;
use super::provider::{GenerationProvider, GenerationRequest, InlineImage};
use crate::config::GeminiConfig;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "Gemini";

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(client: Client, config: GeminiConfig, api_key: Option<String>) -> Self {
        Self {
            client,
            config,
            api_key,
        }
    }

    /// Build the API URL for the configured model
    fn api_url(&self, api_key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            api_key
        )
    }

    fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
        // Images first, instruction last
        let mut parts: Vec<ContentPart> = request
            .images
            .iter()
            .map(|image: &InlineImage| ContentPart::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                },
            })
            .collect();
        parts.push(ContentPart::Text {
            text: request.prompt.clone(),
        });

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: Some(request.temperature),
                response_mime_type: request
                    .response_schema
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema: request.response_schema.clone(),
            },
        }
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LedgerError::MissingCredential(ProviderKind::Gemini.display_name()))?;

        let body = Self::build_request(&request);

        tracing::debug!(
            "[Gemini] Sending request to {} (prompt {} chars, {} images ~{} KB, schema: {})",
            self.config.model,
            request.prompt.len(),
            request.images.len(),
            request.images.iter().map(InlineImage::byte_len).sum::<usize>() / 1024,
            request.response_schema.is_some()
        );

        let response = self
            .client
            .post(self.api_url(api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Network {
                provider: PROVIDER,
                // reqwest errors embed the URL, which carries the key
                message: e.without_url().to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| LedgerError::Network {
            provider: PROVIDER,
            message: e.without_url().to_string(),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            tracing::warn!("[Gemini] API error {}: {}", status, message);
            return Err(LedgerError::ProviderHttp {
                provider: PROVIDER,
                status: status.as_u16(),
                message,
            });
        }

        parse_generation_body(&text)
    }
}

/// Concatenate the text parts of the first candidate
fn parse_generation_body(body: &str) -> Result<String> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(LedgerError::parse)?;

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .map(|c| {
            c.content
                .parts
                .into_iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text),
                    ContentPart::InlineData { .. } => None,
                })
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LedgerError::EmptyResponse(PROVIDER));
    }

    Ok(text)
}

// API request/response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_places_images_before_prompt() {
        let request = GenerationRequest {
            prompt: "read this".to_string(),
            images: vec![InlineImage::from_bytes("image/png", b"png")],
            temperature: 0.0,
            response_schema: None,
        };
        let body = serde_json::to_value(GeminiClient::build_request(&request)).unwrap();

        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "cG5n");
        assert_eq!(parts[1]["text"], "read this");
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_schema_sets_json_mime_type() {
        let request = GenerationRequest {
            prompt: "p".to_string(),
            images: vec![],
            temperature: 0.1,
            response_schema: Some(json!({"type": "OBJECT"})),
        };
        let body = serde_json::to_value(GeminiClient::build_request(&request)).unwrap();
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_api_url() {
        let client = GeminiClient::new(Client::new(), GeminiConfig::default(), None);
        assert_eq!(
            client.api_url("k"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent?key=k"
        );
    }

    #[test]
    fn test_parse_generation_body_joins_text_parts() {
        let body = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]},
                "finishReason": "STOP"
            }]
        })
        .to_string();
        assert_eq!(parse_generation_body(&body).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_parse_generation_body_without_candidates() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string();
        assert!(matches!(
            parse_generation_body(&body),
            Err(LedgerError::EmptyResponse("Gemini"))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let client = GeminiClient::new(Client::new(), GeminiConfig::default(), None);
        let err = client.generate(GenerationRequest::default()).await.unwrap_err();
        assert!(matches!(err, LedgerError::MissingCredential("Gemini")));
    }
}
