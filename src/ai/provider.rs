//! Provider abstractions.
//!
//! Two transports with different capabilities sit behind these traits:
//! a chat-completions endpoint (text only, JSON-object mode) and a
//! structured-generation endpoint (inline images, explicit response schema).
//! The orchestrator depends only on the traits so tests can swap in mocks.

use crate::error::Result;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Role of a chat-completions message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One chat-completions message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: MessageRole,
    pub content: String,
}

impl CompletionMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Requested response format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    JsonObject,
    Text,
}

/// Chat-completions call parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub format: ResponseFormat,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            format: ResponseFormat::JsonObject,
        }
    }
}

/// Base64 image attached to a generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64, no data-URL prefix
    pub data: String,
}

impl InlineImage {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Approximate decoded size
    pub fn byte_len(&self) -> usize {
        self.data.len() / 4 * 3
    }
}

/// Structured-generation call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub images: Vec<InlineImage>,
    pub temperature: f32,
    /// Response schema in the provider's schema dialect; `None` for free text
    pub response_schema: Option<serde_json::Value>,
}

/// Text-only chat-completions provider
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return the raw content of the first choice
    async fn complete(
        &self,
        messages: &[CompletionMessage],
        options: CompletionOptions,
    ) -> Result<String>;
}

/// Vision-capable provider with schema-constrained output
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return the concatenated text of the first candidate
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_value(CompletionMessage::assistant("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "ok"}));
    }

    #[test]
    fn test_inline_image_encodes_base64() {
        let image = InlineImage::from_bytes("image/png", b"abc");
        assert_eq!(image.data, "YWJj");
        assert_eq!(image.byte_len(), 3);
    }
}
