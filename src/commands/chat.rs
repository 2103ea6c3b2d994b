//! Chat commands
//!
//! - send_chat_message: ask the assistant, route its directive
//! - confirm_pending_mutation / reject_pending_mutation: resolve a proposal

use super::statement::StatementView;
use super::AppState;
use crate::ai::InlineImage;
use crate::chat::ChatOutcome;
use crate::error::LedgerError;
use crate::extraction::FileBlob;
use serde::Serialize;

/// Assistant turn as shown to the user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response_text: String,
    /// A mutation is parked and needs a yes/no
    pub awaiting_confirmation: bool,
    /// Set when the directive was an undo
    pub undone: Option<bool>,
}

/// Send one chat message, optionally with an image
pub async fn send_chat_message(
    state: &AppState,
    message: String,
    image: Option<FileBlob>,
) -> Result<ChatReply, String> {
    let (report, history) = {
        let mut ws = state.workspace.lock().await;
        let report = ws
            .ledger
            .report()
            .cloned()
            .ok_or_else(|| LedgerError::EmptyLedger.to_string())?;
        let history = ws.chat.transcript().to_vec();
        ws.chat.record_user(message.clone());
        (report, history)
    };

    let image = image.map(|blob| InlineImage::from_bytes(blob.media_type, &blob.bytes));

    let directive = state
        .orchestrator
        .generate_chat_directive(&message, &history, &report, image.as_ref())
        .await;

    let mut guard = state.workspace.lock().await;
    let ws = &mut *guard;
    let outcome = ws.chat.route(&directive, &mut ws.ledger);

    Ok(ChatReply {
        response_text: directive.response_text,
        awaiting_confirmation: matches!(outcome, ChatOutcome::AwaitingConfirmation(_)),
        undone: match outcome {
            ChatOutcome::Undone(applied) => Some(applied),
            _ => None,
        },
    })
}

/// Apply the parked mutation
pub async fn confirm_pending_mutation(state: &AppState) -> Result<StatementView, String> {
    let mut guard = state.workspace.lock().await;
    let ws = &mut *guard;
    ws.chat.confirm(&mut ws.ledger).map_err(|e| e.to_string())?;
    StatementView::from_session(&ws.ledger).ok_or_else(|| LedgerError::EmptyLedger.to_string())
}

/// Discard the parked mutation. Returns false when there was none.
pub async fn reject_pending_mutation(state: &AppState) -> bool {
    state.workspace.lock().await.chat.reject()
}
