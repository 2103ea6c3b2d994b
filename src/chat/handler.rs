//! Routes chat directives into ledger mutations.
//!
//! `update` and `add` never touch the ledger directly: they are parked as a
//! pending mutation until the user confirms. `undo` runs immediately.

use super::directive::{ChatAction, ChatMessage, ChatMutationDirective, ChatRole};
use crate::error::{LedgerError, Result};
use crate::ledger::LedgerSession;
use crate::models::{FieldUpdate, TransactionDraft};

/// Mutation awaiting user confirmation
#[derive(Debug, Clone, PartialEq)]
pub enum PendingMutation {
    Update(FieldUpdate),
    Add(TransactionDraft),
}

/// What the host should do after a directive was routed
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    /// Show the reply, nothing else
    Reply,
    /// Show the reply and ask the user to confirm
    AwaitingConfirmation(PendingMutation),
    /// Undo was attempted; `false` when there was nothing to undo
    Undone(bool),
}

/// Chat transcript plus the single pending mutation slot
#[derive(Debug, Default)]
pub struct ChatHandler {
    transcript: Vec<ChatMessage>,
    pending: Option<PendingMutation>,
}

impl ChatHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn pending(&self) -> Option<&PendingMutation> {
        self.pending.as_ref()
    }

    pub fn record_user(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatMessage::new(ChatRole::User, content));
    }

    /// Forget the conversation, e.g. when a new statement is loaded
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.pending = None;
    }

    /// Record the assistant reply and route its action.
    ///
    /// A directive that breaks the contract is logged and handled
    /// conservatively: a mutation without payload degrades to a reply, and a
    /// mutation is always parked for confirmation whatever the flag says.
    pub fn route(
        &mut self,
        directive: &ChatMutationDirective,
        ledger: &mut LedgerSession,
    ) -> ChatOutcome {
        self.transcript
            .push(ChatMessage::new(ChatRole::Model, directive.response_text.clone()));

        if let Err(violation) = directive.check() {
            tracing::warn!("[Chat] Directive violates contract: {}", violation);
        }

        // Any new directive supersedes an unconfirmed proposal
        self.pending = None;

        match directive.action {
            ChatAction::Query => ChatOutcome::Reply,
            ChatAction::Undo => {
                let undone = ledger.undo();
                tracing::info!("[Chat] Undo requested, applied: {}", undone);
                ChatOutcome::Undone(undone)
            }
            ChatAction::Update | ChatAction::Add => match Self::pending_from(directive) {
                Some(pending) => {
                    tracing::info!("[Chat] Holding {} for confirmation", directive.action);
                    self.pending = Some(pending.clone());
                    ChatOutcome::AwaitingConfirmation(pending)
                }
                None => ChatOutcome::Reply,
            },
        }
    }

    fn pending_from(directive: &ChatMutationDirective) -> Option<PendingMutation> {
        match directive.action {
            ChatAction::Update => directive
                .update
                .as_ref()
                .map(|u| PendingMutation::Update(u.to_field_update())),
            ChatAction::Add => directive.add.clone().map(PendingMutation::Add),
            ChatAction::Query | ChatAction::Undo => None,
        }
    }

    /// Apply the pending mutation through the ledger
    pub fn confirm(&mut self, ledger: &mut LedgerSession) -> Result<()> {
        let pending = self.pending.take().ok_or(LedgerError::NoPendingMutation)?;
        match pending {
            PendingMutation::Update(update) => ledger.apply_update(&update)?,
            PendingMutation::Add(draft) => {
                ledger.add_transaction(draft)?;
            }
        }
        tracing::info!("[Chat] Pending mutation confirmed and applied");
        Ok(())
    }

    /// Drop the pending mutation. Returns false when there was none.
    pub fn reject(&mut self) -> bool {
        let had_pending = self.pending.take().is_some();
        if had_pending {
            tracing::info!("[Chat] Pending mutation rejected");
        }
        had_pending
    }
}
