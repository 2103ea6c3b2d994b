//! DeepSeek chat-completions client
//!
//! OpenAI-compatible `/chat/completions` transport with bearer auth and
//! JSON-object response mode. No retry loop: a failure is handed back to the
//! orchestrator, which decides whether to fall back.

use super::credentials::ProviderKind;
use super::provider::{CompletionMessage, CompletionOptions, CompletionProvider, ResponseFormat};
use crate::config::DeepSeekConfig;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "DeepSeek";

/// DeepSeek API client
pub struct DeepSeekClient {
    client: Client,
    config: DeepSeekConfig,
    api_key: Option<String>,
}

impl DeepSeekClient {
    pub fn new(client: Client, config: DeepSeekConfig, api_key: Option<String>) -> Self {
        Self {
            client,
            config,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [CompletionMessage],
        options: CompletionOptions,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages,
            temperature: options.temperature,
            response_format: ResponseFormatBody {
                format_type: match options.format {
                    ResponseFormat::JsonObject => "json_object",
                    ResponseFormat::Text => "text",
                },
            },
            stream: false,
        }
    }
}

#[async_trait]
impl CompletionProvider for DeepSeekClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(
        &self,
        messages: &[CompletionMessage],
        options: CompletionOptions,
    ) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LedgerError::MissingCredential(ProviderKind::DeepSeek.display_name()))?;

        let request = self.build_request(messages, options);

        tracing::debug!(
            "[DeepSeek] Sending {} messages to model {}",
            messages.len(),
            self.config.model
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Network {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| LedgerError::Network {
            provider: PROVIDER,
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            tracing::warn!("[DeepSeek] API error {}: {}", status, message);
            return Err(LedgerError::ProviderHttp {
                provider: PROVIDER,
                status: status.as_u16(),
                message,
            });
        }

        parse_completion_body(&body)
    }
}

/// Pull `choices[0].message.content` out of a success body
fn parse_completion_body(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(LedgerError::parse)?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(LedgerError::EmptyResponse(PROVIDER));
    }

    Ok(content)
}

// API request/response types

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [CompletionMessage],
    temperature: f32,
    response_format: ResponseFormatBody,
    stream: bool,
}

#[derive(Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
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

    fn client(api_key: Option<&str>) -> DeepSeekClient {
        DeepSeekClient::new(
            Client::new(),
            DeepSeekConfig::default(),
            api_key.map(str::to_string),
        )
    }

    #[test]
    fn test_request_body_shape() {
        let c = client(Some("sk-test"));
        let messages = vec![
            CompletionMessage::system("rules"),
            CompletionMessage::user("statement"),
        ];
        let body = serde_json::to_value(c.build_request(&messages, CompletionOptions::default()))
            .unwrap();

        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["stream"], false);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "statement");
        assert!((body["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let c = DeepSeekClient::new(
            Client::new(),
            DeepSeekConfig {
                base_url: "http://localhost:9000/".to_string(),
                ..Default::default()
            },
            None,
        );
        assert_eq!(c.endpoint(), "http://localhost:9000/chat/completions");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let c = client(None);
        let err = c
            .complete(&[CompletionMessage::user("hi")], CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::MissingCredential("DeepSeek")));
    }

    #[test]
    fn test_parse_completion_body() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}]}"#;
        assert_eq!(parse_completion_body(body).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_parse_completion_body_empty() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  "}}]}"#;
        assert!(matches!(
            parse_completion_body(body),
            Err(LedgerError::EmptyResponse("DeepSeek"))
        ));
        assert!(matches!(
            parse_completion_body(r#"{"choices":[]}"#),
            Err(LedgerError::EmptyResponse(_))
        ));
    }
}
