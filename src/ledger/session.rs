//! Session state: current report, edit history, and persisted input.

use crate::error::{LedgerError, Result};
use crate::history::{EditHistory, KeyValueStore, FILE_NAME_KEY, STATEMENT_CONTENT_KEY};
use crate::models::{
    today_statement_date, Amount, FieldUpdate, StatementReport, Transaction, TransactionDraft,
};
use crate::reconcile::{self, BalanceMismatch, LedgerTotals, ReconciledRow};
use std::sync::Arc;

/// Whether an analysed report is present
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerState {
    Empty,
    Loaded {
        current: StatementReport,
        history: EditHistory,
    },
}

/// Single-user ledger session.
///
/// Owns the current report and its undo stack. Raw statement text and the
/// display filename are loaded from the store on construction and written
/// back whenever they change.
pub struct LedgerSession {
    store: Arc<dyn KeyValueStore>,
    state: LedgerState,
    statement_content: String,
    file_name: String,
    opening_balance: Amount,
}

impl LedgerSession {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let statement_content = store.load(STATEMENT_CONTENT_KEY).unwrap_or_default();
        let file_name = store.load(FILE_NAME_KEY).unwrap_or_default();

        if !statement_content.is_empty() {
            tracing::info!(
                "[Ledger] Restored {} chars of statement content ({})",
                statement_content.len(),
                file_name
            );
        }

        Self {
            store,
            state: LedgerState::Empty,
            statement_content,
            file_name,
            opening_balance: 0.0,
        }
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn report(&self) -> Option<&StatementReport> {
        match &self.state {
            LedgerState::Empty => None,
            LedgerState::Loaded { current, .. } => Some(current),
        }
    }

    pub fn history_len(&self) -> usize {
        match &self.state {
            LedgerState::Empty => 0,
            LedgerState::Loaded { history, .. } => history.len(),
        }
    }

    pub fn statement_content(&self) -> &str {
        &self.statement_content
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn opening_balance(&self) -> Amount {
        self.opening_balance
    }

    pub fn set_statement_content(&mut self, content: impl Into<String>) -> Result<()> {
        self.statement_content = content.into();
        self.store.save(STATEMENT_CONTENT_KEY, &self.statement_content)
    }

    pub fn set_file_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.file_name = name.into();
        self.store.save(FILE_NAME_KEY, &self.file_name)
    }

    /// New file selection: forget the report and the extracted text
    pub fn reset_for_new_files(&mut self, file_name: impl Into<String>) -> Result<()> {
        self.state = LedgerState::Empty;
        self.opening_balance = 0.0;
        self.set_statement_content(String::new())?;
        self.set_file_name(file_name)
    }

    /// A new analysis result replaces the report and all history
    pub fn load_report(&mut self, report: StatementReport) {
        tracing::info!(
            "[Ledger] Loaded report with {} transactions (opening {}, ending {})",
            report.transactions.len(),
            report.opening_balance,
            report.ending_balance
        );
        self.opening_balance = report.opening_balance;
        self.state = LedgerState::Loaded {
            history: EditHistory::new(report.clone()),
            current: report,
        };
    }

    /// User override of the opening balance; not part of undo history
    pub fn set_opening_balance(&mut self, value: Amount) {
        self.opening_balance = value;
    }

    /// Edit one cell. The pre-edit report is pushed first.
    pub fn apply_update(&mut self, update: &FieldUpdate) -> Result<()> {
        self.mutate(|report| update.apply_to(report))?;
        tracing::debug!("[Ledger] Applied {:?}", update);
        Ok(())
    }

    /// Append a transaction built from a draft, filling defaults
    pub fn add_transaction(&mut self, draft: TransactionDraft) -> Result<&Transaction> {
        let transaction = draft.into_transaction(&today_statement_date());
        self.mutate(|report| {
            report.transactions.push(transaction);
            Ok(())
        })?;

        self.report()
            .and_then(|r| r.transactions.last())
            .ok_or(LedgerError::EmptyLedger)
    }

    /// Restore the most recent snapshot. Returns false when nothing can be undone.
    pub fn undo(&mut self) -> bool {
        match &mut self.state {
            LedgerState::Empty => false,
            LedgerState::Loaded { current, history } => match history.pop() {
                Some(previous) => {
                    *current = previous;
                    tracing::debug!("[Ledger] Undo, {} snapshots left", history.len());
                    true
                }
                None => false,
            },
        }
    }

    fn mutate<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut StatementReport) -> Result<()>,
    {
        let LedgerState::Loaded { current, history } = &mut self.state else {
            return Err(LedgerError::EmptyLedger);
        };

        let mut next = current.clone();
        edit(&mut next)?;

        let previous = std::mem::replace(current, next);
        history.push(previous);
        Ok(())
    }

    pub fn balance_mismatch(&self) -> Option<BalanceMismatch> {
        let report = self.report()?;
        reconcile::check_ending_balance(
            self.opening_balance,
            &report.transactions,
            report.ending_balance,
        )
    }

    pub fn reconciled_rows(&self) -> Vec<ReconciledRow<'_>> {
        self.report()
            .map(|r| reconcile::reconciled_rows(self.opening_balance, &r.transactions))
            .unwrap_or_default()
    }

    pub fn totals(&self) -> Option<LedgerTotals> {
        self.report()
            .map(|r| reconcile::totals(self.opening_balance, &r.transactions))
    }
}
