//! Running-balance computation and ending-balance cross-check.
//!
//! Everything here is recomputed from scratch on each call. Nothing is cached,
//! so an edit, an add, an opening-balance change or an undo can never leave a
//! stale partial sum behind.

use crate::models::{Amount, Transaction};
use serde::Serialize;

/// Difference tolerated between computed and claimed ending balance
pub const BALANCE_TOLERANCE: Amount = 1.0;

/// Discrepancy between the computed and the printed ending balance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceMismatch {
    pub computed: Amount,
    pub claimed: Amount,
    /// computed - claimed
    pub difference: Amount,
}

impl BalanceMismatch {
    /// Warning banner text
    pub fn message(&self) -> String {
        format!(
            "Số dư cuối kỳ tính toán ({}) không khớp với số dư trên sao kê ({}). Chênh lệch: {}. Vui lòng rà soát lại các giao dịch.",
            format_vnd(self.computed),
            format_vnd(self.claimed),
            format_vnd(self.difference)
        )
    }
}

/// Column sums over all transactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub total_debit: Amount,
    pub total_credit: Amount,
    pub total_fee: Amount,
    pub total_vat: Amount,
    pub computed_ending_balance: Amount,
}

/// A transaction with the balance after it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledRow<'a> {
    pub index: usize,
    pub transaction: &'a Transaction,
    pub running_balance: Amount,
}

/// Balances after each transaction: `balance[i]` for i in 1..=n
pub fn running_balances(opening_balance: Amount, transactions: &[Transaction]) -> Vec<Amount> {
    transactions
        .iter()
        .scan(opening_balance, |balance, tx| {
            *balance += tx.net_change();
            Some(*balance)
        })
        .collect()
}

/// `balance[n]`
pub fn computed_ending_balance(opening_balance: Amount, transactions: &[Transaction]) -> Amount {
    running_balances(opening_balance, transactions)
        .last()
        .copied()
        .unwrap_or(opening_balance)
}

/// Flag a mismatch when a claimed balance exists and differs by more than the tolerance
pub fn check_ending_balance(
    opening_balance: Amount,
    transactions: &[Transaction],
    claimed_ending_balance: Amount,
) -> Option<BalanceMismatch> {
    if claimed_ending_balance == 0.0 {
        return None;
    }

    let computed = computed_ending_balance(opening_balance, transactions);
    let difference = computed - claimed_ending_balance;

    if difference.abs() > BALANCE_TOLERANCE {
        tracing::debug!(
            "[Reconcile] Mismatch: computed {} vs claimed {} (diff {})",
            computed,
            claimed_ending_balance,
            difference
        );
        Some(BalanceMismatch {
            computed,
            claimed: claimed_ending_balance,
            difference,
        })
    } else {
        None
    }
}

pub fn totals(opening_balance: Amount, transactions: &[Transaction]) -> LedgerTotals {
    let mut totals = transactions
        .iter()
        .fold(LedgerTotals::default(), |mut acc, tx| {
            acc.total_debit += tx.debit;
            acc.total_credit += tx.credit;
            acc.total_fee += tx.fee;
            acc.total_vat += tx.vat;
            acc
        });
    totals.computed_ending_balance = computed_ending_balance(opening_balance, transactions);
    totals
}

/// Per-row view used by export surfaces
pub fn reconciled_rows(opening_balance: Amount, transactions: &[Transaction]) -> Vec<ReconciledRow<'_>> {
    transactions
        .iter()
        .zip(running_balances(opening_balance, transactions))
        .enumerate()
        .map(|(index, (transaction, running_balance))| ReconciledRow {
            index,
            transaction,
            running_balance,
        })
        .collect()
}

/// Format an amount with vi-VN grouping: `1.234.567`, `-1.000`, `1.234,5`
pub fn format_vnd(value: Amount) -> String {
    let negative = value < 0.0;
    let abs = value.abs();
    let rounded = (abs * 1000.0).round() / 1000.0;
    let integer = rounded.trunc() as u64;
    let fraction = rounded - rounded.trunc();

    let digits = integer.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if fraction > 0.0 {
        let frac = format!("{:.3}", fraction);
        let frac = frac.trim_start_matches('0').trim_start_matches('.').trim_end_matches('0');
        if !frac.is_empty() {
            grouped.push(',');
            grouped.push_str(frac);
        }
    }

    if negative && grouped != "0" {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(debit: Amount, credit: Amount, fee: Amount, vat: Amount) -> Transaction {
        Transaction {
            transaction_code: None,
            date: "01/03/2024".to_string(),
            description: "test".to_string(),
            debit,
            credit,
            fee,
            vat,
        }
    }

    #[test]
    fn test_matching_ending_balance() {
        let txs = vec![tx(200_000.0, 0.0, 0.0, 0.0)];
        assert_eq!(running_balances(1_000_000.0, &txs), vec![1_200_000.0]);
        assert_eq!(check_ending_balance(1_000_000.0, &txs, 1_200_000.0), None);
    }

    #[test]
    fn test_mismatch_carries_difference() {
        let txs = vec![tx(200_000.0, 0.0, 0.0, 0.0)];
        let mismatch = check_ending_balance(1_000_000.0, &txs, 1_199_000.0).unwrap();
        assert_eq!(mismatch.computed, 1_200_000.0);
        assert_eq!(mismatch.claimed, 1_199_000.0);
        assert_eq!(mismatch.difference, 1_000.0);
    }

    #[test]
    fn test_no_check_without_claimed_balance() {
        let txs = vec![tx(0.0, 5_000_000.0, 0.0, 0.0)];
        assert_eq!(check_ending_balance(0.0, &txs, 0.0), None);
    }

    #[test]
    fn test_tolerance_boundary() {
        let txs = vec![tx(100.0, 0.0, 0.0, 0.0)];
        assert_eq!(check_ending_balance(0.0, &txs, 99.0), None);
        assert!(check_ending_balance(0.0, &txs, 98.5).is_some());
        assert_eq!(check_ending_balance(0.0, &txs, 100.5), None);
    }

    #[test]
    fn test_recurrence_matches_closed_form() {
        let txs = vec![
            tx(5_000_000.0, 0.0, 0.0, 0.0),
            tx(0.0, 10_000_000.0, 10_000.0, 1_000.0),
            tx(250_000.0, 0.0, 0.0, 0.0),
            tx(0.0, 0.0, 22_000.0, 2_200.0),
            tx(120.5, 40.25, 0.0, 0.0),
        ];
        let opening = 20_000_000.0;
        let closed_form: Amount = opening + txs.iter().map(|t| t.debit - t.credit - t.fee - t.vat).sum::<Amount>();
        assert!((computed_ending_balance(opening, &txs) - closed_form).abs() < 1e-6);
        assert_eq!(running_balances(opening, &txs).len(), txs.len());
    }

    #[test]
    fn test_empty_transactions_end_at_opening() {
        assert_eq!(computed_ending_balance(42.0, &[]), 42.0);
        assert!(running_balances(42.0, &[]).is_empty());
    }

    #[test]
    fn test_totals_and_rows() {
        let txs = vec![tx(100.0, 0.0, 0.0, 0.0), tx(0.0, 30.0, 5.0, 0.5)];
        let totals = totals(10.0, &txs);
        assert_eq!(totals.total_debit, 100.0);
        assert_eq!(totals.total_credit, 30.0);
        assert_eq!(totals.total_fee, 5.0);
        assert_eq!(totals.total_vat, 0.5);
        assert_eq!(totals.computed_ending_balance, 74.5);

        let rows = reconciled_rows(10.0, &txs);
        assert_eq!(rows[0].running_balance, 110.0);
        assert_eq!(rows[1].running_balance, 74.5);
        assert_eq!(rows[1].index, 1);
    }

    #[test]
    fn test_format_vnd() {
        assert_eq!(format_vnd(0.0), "0");
        assert_eq!(format_vnd(1_000.0), "1.000");
        assert_eq!(format_vnd(1_234_567.0), "1.234.567");
        assert_eq!(format_vnd(-1_000.0), "-1.000");
        assert_eq!(format_vnd(1_234.5), "1.234,5");
    }

    #[test]
    fn test_mismatch_message() {
        let mismatch = BalanceMismatch {
            computed: 1_200_000.0,
            claimed: 1_199_000.0,
            difference: 1_000.0,
        };
        let message = mismatch.message();
        assert!(message.contains("1.200.000"));
        assert!(message.contains("Chênh lệch: 1.000"));
    }
}
