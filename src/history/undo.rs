//! Snapshot stack backing multi-level undo of ledger edits.

use crate::models::StatementReport;

/// Full-value report snapshots, oldest first.
///
/// The first entry is the report exactly as analysis produced it and is never
/// removed. Edits push the pre-edit report; undo pops the most recent one.
#[derive(Debug, Clone, PartialEq)]
pub struct EditHistory {
    snapshots: Vec<StatementReport>,
}

impl EditHistory {
    /// Start a history whose base entry is the freshly analysed report
    pub fn new(initial: StatementReport) -> Self {
        Self {
            snapshots: vec![initial],
        }
    }

    /// Record the report as it was before an edit
    pub fn push(&mut self, snapshot: StatementReport) {
        self.snapshots.push(snapshot);
    }

    /// Remove and return the most recent snapshot.
    ///
    /// Returns `None` when only the base entry is left.
    pub fn pop(&mut self) -> Option<StatementReport> {
        if self.snapshots.len() <= 1 {
            return None;
        }
        self.snapshots.pop()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: a history holds at least its base entry
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.snapshots.len() > 1
    }

    /// The post-analysis snapshot
    pub fn base(&self) -> &StatementReport {
        &self.snapshots[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountInfo;

    fn report(opening: f64) -> StatementReport {
        StatementReport {
            opening_balance: opening,
            ending_balance: 0.0,
            account_info: AccountInfo::default(),
            transactions: vec![],
        }
    }

    #[test]
    fn test_base_entry_is_never_popped() {
        let mut history = EditHistory::new(report(1.0));
        assert!(!history.can_undo());
        assert_eq!(history.pop(), None);
        assert_eq!(history.len(), 1);
        assert_eq!(history.base().opening_balance, 1.0);
    }

    #[test]
    fn test_pop_returns_most_recent() {
        let mut history = EditHistory::new(report(1.0));
        history.push(report(2.0));
        history.push(report(3.0));
        assert_eq!(history.pop().map(|r| r.opening_balance), Some(3.0));
        assert_eq!(history.pop().map(|r| r.opening_balance), Some(2.0));
        assert_eq!(history.pop(), None);
        assert_eq!(history.len(), 1);
    }
}
