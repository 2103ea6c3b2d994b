//! Statement Orchestrator
//!
//! Sequences the AI calls for a statement:
//! 1. OCR of page images (vision provider only)
//! 2. Structured analysis (chat-completions provider, one schema-constrained
//!    fallback on the vision provider)
//! 3. Chat directives (same primary/fallback pair; never fails)

use super::credentials::{CredentialManager, ProviderKind};
use super::deepseek::DeepSeekClient;
use super::gemini::GeminiClient;
use super::http_client::{completion_client, generation_client};
use super::prompts;
use super::provider::{
    CompletionMessage, CompletionOptions, CompletionProvider, GenerationProvider,
    GenerationRequest, InlineImage, ResponseFormat,
};
use super::schema::{chat_directive_schema, statement_report_schema};
use super::utils::extract_json_object;
use crate::chat::{ChatMessage, ChatMutationDirective};
use crate::config::AppConfig;
use crate::error::{LedgerError, Result};
use crate::models::StatementReport;
use std::sync::Arc;

/// Temperature for the schema-constrained fallback calls
const FALLBACK_TEMPERATURE: f32 = 0.1;

/// Primary/fallback AI pipeline
pub struct StatementOrchestrator {
    primary: Arc<dyn CompletionProvider>,
    vision: Arc<dyn GenerationProvider>,
    temperature: f32,
}

impl StatementOrchestrator {
    pub fn new(
        primary: Arc<dyn CompletionProvider>,
        vision: Arc<dyn GenerationProvider>,
        temperature: f32,
    ) -> Self {
        Self {
            primary,
            vision,
            temperature,
        }
    }

    /// Wire the real providers using stored or environment credentials
    pub fn from_config(config: &AppConfig) -> Self {
        let primary = DeepSeekClient::new(
            completion_client().clone(),
            config.deepseek.clone(),
            CredentialManager::get_api_key(ProviderKind::DeepSeek),
        );
        let vision = GeminiClient::new(
            generation_client().clone(),
            config.gemini.clone(),
            CredentialManager::get_api_key(ProviderKind::Gemini),
        );

        Self::new(
            Arc::new(primary),
            Arc::new(vision),
            config.deepseek.temperature,
        )
    }

    fn primary_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            format: ResponseFormat::JsonObject,
        }
    }

    /// OCR all images in one call. No images means no call, and a blank
    /// response (nothing legible) is empty text.
    pub async fn recognize_text(&self, images: &[InlineImage]) -> Result<String> {
        if images.is_empty() {
            return Ok(String::new());
        }

        tracing::info!(
            "[Orchestrator] Recognizing text from {} images via {}",
            images.len(),
            self.vision.name()
        );

        let result = self
            .vision
            .generate(GenerationRequest {
                prompt: prompts::OCR_PROMPT.to_string(),
                images: images.to_vec(),
                temperature: 0.0,
                response_schema: None,
            })
            .await;

        match result {
            Ok(text) => Ok(text.trim().to_string()),
            Err(LedgerError::EmptyResponse(provider)) => {
                tracing::warn!("[Orchestrator] {} found no text in the images", provider);
                Ok(String::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Turn statement text into a validated report
    pub async fn analyze_statement(&self, text: &str) -> Result<StatementReport> {
        match self.analyze_with_primary(text).await {
            Ok(report) => {
                tracing::info!(
                    "[Orchestrator] {} returned {} transactions",
                    self.primary.name(),
                    report.transactions.len()
                );
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(
                    "[Orchestrator] {} analysis failed ({}), falling back to {}",
                    self.primary.name(),
                    e,
                    self.vision.name()
                );
                let report = self.analyze_with_fallback(text).await?;
                tracing::info!(
                    "[Orchestrator] Fallback returned {} transactions",
                    report.transactions.len()
                );
                Ok(report)
            }
        }
    }

    async fn analyze_with_primary(&self, text: &str) -> Result<StatementReport> {
        let messages = [
            CompletionMessage::system(prompts::build_analysis_system_prompt()),
            CompletionMessage::user(prompts::build_analysis_user_prompt(text)),
        ];
        let raw = self.primary.complete(&messages, self.primary_options()).await?;
        StatementReport::from_json(&extract_json_object(&raw)?)
    }

    async fn analyze_with_fallback(&self, text: &str) -> Result<StatementReport> {
        let raw = self
            .vision
            .generate(GenerationRequest {
                prompt: prompts::build_analysis_fallback_prompt(text),
                images: Vec::new(),
                temperature: FALLBACK_TEMPERATURE,
                response_schema: Some(statement_report_schema()),
            })
            .await?;
        StatementReport::from_json(&extract_json_object(&raw)?)
    }

    /// Produce the assistant's directive for a chat turn. Never fails.
    pub async fn generate_chat_directive(
        &self,
        message: &str,
        history: &[ChatMessage],
        report: &StatementReport,
        image: Option<&InlineImage>,
    ) -> ChatMutationDirective {
        if image.is_none() {
            let messages = prompts::build_chat_messages(report, history, message);
            match self.primary.complete(&messages, self.primary_options()).await {
                Ok(raw) => match ChatMutationDirective::from_payload(&raw) {
                    Ok(directive) => return directive,
                    Err(e) => tracing::warn!(
                        "[Orchestrator] Unusable chat payload from {}: {}",
                        self.primary.name(),
                        e
                    ),
                },
                Err(e) => tracing::warn!(
                    "[Orchestrator] {} chat failed: {}",
                    self.primary.name(),
                    e
                ),
            }
        }

        let request = GenerationRequest {
            prompt: prompts::build_chat_fallback_prompt(report, history, message),
            images: image.cloned().into_iter().collect(),
            temperature: FALLBACK_TEMPERATURE,
            response_schema: Some(chat_directive_schema()),
        };

        self.vision
            .generate(request)
            .await
            .and_then(|raw| ChatMutationDirective::from_payload(&raw))
            .unwrap_or_else(|e| {
                tracing::error!("[Orchestrator] Chat unavailable on both providers: {}", e);
                ChatMutationDirective::unavailable()
            })
    }
}
