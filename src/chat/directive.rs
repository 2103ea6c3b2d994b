//! Structured chat reply and the conversation log
//!
//! A chat turn returns a `ChatMutationDirective`: conversational text plus at
//! most one proposed ledger mutation. Payloads are parsed strictly; an unknown
//! `update.field` or a negative amount is a parse error.

use crate::ai::provider::CompletionMessage;
use crate::ai::prompts::CHAT_UNAVAILABLE_REPLY;
use crate::ai::utils::parse_json_payload;
use crate::error::{LedgerError, Result};
use crate::models::{Amount, FieldUpdate, NumericField, TransactionDraft};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Speaker in the chat transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    /// Label used when the transcript is flattened into a single prompt
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "Người dùng",
            ChatRole::Model => "Trợ lý",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// `model` turns become `assistant` turns
    pub fn to_completion_message(&self) -> CompletionMessage {
        match self.role {
            ChatRole::User => CompletionMessage::user(self.content.clone()),
            ChatRole::Model => CompletionMessage::assistant(self.content.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatAction {
    Update,
    Undo,
    Add,
    Query,
}

impl fmt::Display for ChatAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatAction::Update => "update",
            ChatAction::Undo => "undo",
            ChatAction::Add => "add",
            ChatAction::Query => "query",
        };
        f.write_str(name)
    }
}

/// Proposed change to one amount column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayload {
    pub index: usize,
    pub field: NumericField,
    pub new_value: Amount,
}

impl UpdatePayload {
    pub fn to_field_update(&self) -> FieldUpdate {
        FieldUpdate::Numeric {
            index: self.index,
            field: self.field,
            value: self.new_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMutationDirective {
    pub response_text: String,
    pub action: ChatAction,
    #[serde(default)]
    pub update: Option<UpdatePayload>,
    #[serde(default)]
    pub add: Option<TransactionDraft>,
    #[serde(default)]
    pub confirmation_required: Option<bool>,
}

/// Contract breaches in a directive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveViolation {
    #[error("query directive must not require confirmation")]
    QueryRequestsConfirmation,

    #[error("{0} directive is missing its payload")]
    MissingPayload(ChatAction),

    #[error("{0} directive must require confirmation")]
    ConfirmationNotRequested(ChatAction),
}

impl ChatMutationDirective {
    /// Canned reply used when no provider produced a usable directive
    pub fn unavailable() -> Self {
        Self {
            response_text: CHAT_UNAVAILABLE_REPLY.to_string(),
            action: ChatAction::Query,
            update: None,
            add: None,
            confirmation_required: None,
        }
    }

    /// Parse a provider payload, code fences tolerated
    pub fn from_payload(text: &str) -> Result<Self> {
        let directive: Self = parse_json_payload(text)?;
        if let Some(update) = &directive.update {
            if !update.new_value.is_finite() || update.new_value < 0.0 {
                return Err(LedgerError::Parse(format!(
                    "update.newValue must be a non-negative number, got {}",
                    update.new_value
                )));
            }
        }
        if let Some(add) = &directive.add {
            add.validate()?;
        }
        Ok(directive)
    }

    pub fn requires_confirmation(&self) -> bool {
        self.confirmation_required.unwrap_or(false)
    }

    /// Check the action/payload/confirmation contract
    pub fn check(&self) -> std::result::Result<(), DirectiveViolation> {
        match self.action {
            ChatAction::Query => {
                if self.requires_confirmation() {
                    return Err(DirectiveViolation::QueryRequestsConfirmation);
                }
            }
            ChatAction::Update | ChatAction::Add => {
                let has_payload = match self.action {
                    ChatAction::Update => self.update.is_some(),
                    _ => self.add.is_some(),
                };
                if !has_payload {
                    return Err(DirectiveViolation::MissingPayload(self.action));
                }
                if !self.requires_confirmation() {
                    return Err(DirectiveViolation::ConfirmationNotRequested(self.action));
                }
            }
            ChatAction::Undo => {}
        }
        Ok(())
    }
}
