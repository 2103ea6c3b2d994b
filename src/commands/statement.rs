//! Statement commands: file selection, extraction, analysis, and direct edits.

use super::AppState;
use crate::error::LedgerError;
use crate::extraction::{compose_statement_content, display_file_name, FileBlob};
use crate::ledger::LedgerSession;
use crate::models::{Amount, EditableField, FieldUpdate, StatementReport, Transaction};
use crate::reconcile::LedgerTotals;
use crate::speech::{interpret_transcript, SpeechInput};
use serde::Serialize;
use std::path::PathBuf;

/// One table row with its running balance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowView {
    pub index: usize,
    pub transaction: Transaction,
    pub running_balance: Amount,
}

/// Everything a front end needs to render the ledger
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementView {
    pub report: StatementReport,
    pub opening_balance: Amount,
    pub rows: Vec<RowView>,
    pub totals: LedgerTotals,
    pub mismatch_warning: Option<String>,
    pub can_undo: bool,
}

impl StatementView {
    pub(crate) fn from_session(ledger: &LedgerSession) -> Option<Self> {
        let report = ledger.report()?.clone();
        let rows = ledger
            .reconciled_rows()
            .into_iter()
            .map(|row| RowView {
                index: row.index,
                transaction: row.transaction.clone(),
                running_balance: row.running_balance,
            })
            .collect();

        Some(Self {
            report,
            opening_balance: ledger.opening_balance(),
            rows,
            totals: ledger.totals().unwrap_or_default(),
            mismatch_warning: ledger.balance_mismatch().map(|m| m.message()),
            can_undo: ledger.history_len() > 1,
        })
    }
}

/// Replace the selection. Clears the report, chat and extracted text.
pub async fn select_files(state: &AppState, files: Vec<FileBlob>) -> Result<String, String> {
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    let label = display_file_name(&names);

    let mut ws = state.workspace.lock().await;
    ws.ledger
        .reset_for_new_files(label.clone())
        .map_err(|e| e.to_string())?;
    ws.chat.clear();
    ws.files = files;

    tracing::info!("[Statement] Selected {}", label);
    Ok(label)
}

/// Read files from disk and select them
pub async fn select_paths(state: &AppState, paths: Vec<PathBuf>) -> Result<String, String> {
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        files.push(FileBlob::from_path(path).await.map_err(|e| e.to_string())?);
    }
    select_files(state, files).await
}

/// Extract the selection, OCR any images, and store the statement text
pub async fn extract_content(state: &AppState) -> Result<String, String> {
    let files = state.workspace.lock().await.files.clone();
    if files.is_empty() {
        return Err("Chưa chọn tệp sao kê nào".to_string());
    }

    let extracted = state
        .extractor
        .extract_batch(files)
        .await
        .map_err(|e| e.to_string())?;

    let recognized = if extracted.images.is_empty() {
        None
    } else {
        Some(
            state
                .orchestrator
                .recognize_text(&extracted.images)
                .await
                .map_err(|e| e.to_string())?,
        )
    };

    let content = compose_statement_content(&extracted.text, recognized.as_deref());

    let mut ws = state.workspace.lock().await;
    ws.ledger
        .set_statement_content(content.clone())
        .map_err(|e| e.to_string())?;
    Ok(content)
}

/// Overwrite the statement text by hand
pub async fn set_statement_content(state: &AppState, content: String) -> Result<(), String> {
    let mut ws = state.workspace.lock().await;
    ws.ledger
        .set_statement_content(content)
        .map_err(|e| e.to_string())
}

/// Analyse the stored statement text into a fresh ledger
pub async fn process_statement(state: &AppState) -> Result<StatementView, String> {
    let content = state.workspace.lock().await.ledger.statement_content().to_string();
    if content.trim().is_empty() {
        return Err(LedgerError::EmptyStatement.to_string());
    }

    let report = state
        .orchestrator
        .analyze_statement(&content)
        .await
        .map_err(|e| e.to_string())?;

    let mut ws = state.workspace.lock().await;
    ws.ledger.load_report(report);
    ws.chat.clear();

    StatementView::from_session(&ws.ledger).ok_or_else(|| LedgerError::EmptyLedger.to_string())
}

/// Current ledger, if one is loaded
pub async fn get_statement_view(state: &AppState) -> Option<StatementView> {
    let ws = state.workspace.lock().await;
    StatementView::from_session(&ws.ledger)
}

/// Parse a typed amount: dots are grouping, a comma is the decimal mark
pub fn parse_amount_input(raw: &str) -> Result<Amount, String> {
    let normalized: String = raw
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    match normalized.parse::<Amount>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(format!("'{}' không phải số tiền hợp lệ", raw)),
    }
}

/// Edit one cell by field name
pub async fn update_transaction(
    state: &AppState,
    index: usize,
    field: &str,
    value: &str,
) -> Result<StatementView, String> {
    let field: EditableField = field.parse().map_err(|e: LedgerError| e.to_string())?;
    let update = match field {
        EditableField::Numeric(field) => FieldUpdate::Numeric {
            index,
            field,
            value: parse_amount_input(value)?,
        },
        EditableField::Text(field) => FieldUpdate::Text {
            index,
            field,
            value: value.to_string(),
        },
    };

    let mut ws = state.workspace.lock().await;
    ws.ledger.apply_update(&update).map_err(|e| e.to_string())?;
    StatementView::from_session(&ws.ledger).ok_or_else(|| LedgerError::EmptyLedger.to_string())
}

/// Override the opening balance. An empty input means 0.
pub async fn set_opening_balance(state: &AppState, raw: &str) -> Result<StatementView, String> {
    let value = if raw.trim().is_empty() {
        0.0
    } else {
        let negative = raw.trim_start().starts_with('-');
        let magnitude = parse_amount_input(raw.trim_start().trim_start_matches('-'))?;
        if negative {
            -magnitude
        } else {
            magnitude
        }
    };

    let mut ws = state.workspace.lock().await;
    ws.ledger.set_opening_balance(value);
    StatementView::from_session(&ws.ledger).ok_or_else(|| LedgerError::EmptyLedger.to_string())
}

/// Step back one edit. Returns false when nothing could be undone.
pub async fn undo_last_change(state: &AppState) -> bool {
    state.workspace.lock().await.ledger.undo()
}

/// Dictate into one cell. Returns false when the transcript was unusable.
pub async fn apply_speech(
    state: &AppState,
    index: usize,
    field: EditableField,
    input: &dyn SpeechInput,
) -> Result<bool, String> {
    let Some(transcript) = input.transcribe().await.map_err(|e| e.to_string())? else {
        return Ok(false);
    };

    let Some(update) = interpret_transcript(index, field, &transcript) else {
        tracing::info!("[Statement] Could not read an amount from '{}'", transcript);
        return Ok(false);
    };

    let mut ws = state.workspace.lock().await;
    ws.ledger.apply_update(&update).map_err(|e| e.to_string())?;
    Ok(true)
}
