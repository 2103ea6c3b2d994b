//! Ledger data model: statement report, transactions, and editable fields.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Monetary amount in statement currency units
pub type Amount = f64;

/// Description given to transactions added without one
pub const DEFAULT_TRANSACTION_DESCRIPTION: &str = "Giao dịch mới";

/// Date format used on statements and for added transactions
pub const STATEMENT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Account identity printed on the statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

/// One ledger line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default)]
    pub transaction_code: Option<String>,
    /// DD/MM/YYYY, kept as printed
    pub date: String,
    pub description: String,
    /// Money in (ledger debit)
    pub debit: Amount,
    /// Money out, principal only (ledger credit)
    pub credit: Amount,
    #[serde(default)]
    pub fee: Amount,
    #[serde(default)]
    pub vat: Amount,
}

impl Transaction {
    /// Net effect of this line on the running balance
    pub fn net_change(&self) -> Amount {
        self.debit - self.credit - self.fee - self.vat
    }

    pub fn amount(&self, field: NumericField) -> Amount {
        match field {
            NumericField::Debit => self.debit,
            NumericField::Credit => self.credit,
            NumericField::Fee => self.fee,
            NumericField::Vat => self.vat,
        }
    }

    pub fn set_amount(&mut self, field: NumericField, value: Amount) {
        match field {
            NumericField::Debit => self.debit = value,
            NumericField::Credit => self.credit = value,
            NumericField::Fee => self.fee = value,
            NumericField::Vat => self.vat = value,
        }
    }

    pub fn set_text(&mut self, field: TextField, value: String) {
        match field {
            TextField::TransactionCode => self.transaction_code = Some(value),
            TextField::Date => self.date = value,
            TextField::Description => self.description = value,
        }
    }

    fn validate(&self, index: usize) -> Result<()> {
        for field in NumericField::ALL {
            let value = self.amount(field);
            if !value.is_finite() || value < 0.0 {
                return Err(LedgerError::Parse(format!(
                    "transactions[{}].{} must be a non-negative number, got {}",
                    index, field, value
                )));
            }
        }
        Ok(())
    }
}

/// Structured form of a bank statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementReport {
    pub opening_balance: Amount,
    /// 0 means the statement did not state one
    pub ending_balance: Amount,
    #[serde(default)]
    pub account_info: AccountInfo,
    pub transactions: Vec<Transaction>,
}

impl StatementReport {
    /// Parse and validate a provider payload
    pub fn from_json(json: &str) -> Result<Self> {
        let report: StatementReport = serde_json::from_str(json).map_err(LedgerError::parse)?;
        report.validate()?;
        Ok(report)
    }

    /// Reject amounts that are negative or not finite
    pub fn validate(&self) -> Result<()> {
        if !self.opening_balance.is_finite() {
            return Err(LedgerError::Parse("openingBalance is not a finite number".to_string()));
        }
        if !self.ending_balance.is_finite() {
            return Err(LedgerError::Parse("endingBalance is not a finite number".to_string()));
        }
        for (index, tx) in self.transactions.iter().enumerate() {
            tx.validate(index)?;
        }
        Ok(())
    }

    pub fn transaction_mut(&mut self, index: usize) -> Result<&mut Transaction> {
        let len = self.transactions.len();
        self.transactions
            .get_mut(index)
            .ok_or(LedgerError::TransactionIndex { index, len })
    }
}

/// Amount columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericField {
    Debit,
    Credit,
    Fee,
    Vat,
}

impl NumericField {
    pub const ALL: [NumericField; 4] = [Self::Debit, Self::Credit, Self::Fee, Self::Vat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Fee => "fee",
            Self::Vat => "vat",
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextField {
    TransactionCode,
    Date,
    Description,
}

impl TextField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransactionCode => "transactionCode",
            Self::Date => "date",
            Self::Description => "description",
        }
    }
}

/// Any column a user can edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditableField {
    Numeric(NumericField),
    Text(TextField),
}

impl FromStr for EditableField {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "debit" => Ok(Self::Numeric(NumericField::Debit)),
            "credit" => Ok(Self::Numeric(NumericField::Credit)),
            "fee" => Ok(Self::Numeric(NumericField::Fee)),
            "vat" => Ok(Self::Numeric(NumericField::Vat)),
            "transactionCode" | "code" => Ok(Self::Text(TextField::TransactionCode)),
            "date" => Ok(Self::Text(TextField::Date)),
            "description" => Ok(Self::Text(TextField::Description)),
            other => Err(LedgerError::Parse(format!("unknown field '{}'", other))),
        }
    }
}

/// A single-cell edit
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Numeric {
        index: usize,
        field: NumericField,
        value: Amount,
    },
    Text {
        index: usize,
        field: TextField,
        value: String,
    },
}

impl FieldUpdate {
    pub fn index(&self) -> usize {
        match self {
            Self::Numeric { index, .. } | Self::Text { index, .. } => *index,
        }
    }

    /// Apply to a report, leaving it untouched on error
    pub fn apply_to(&self, report: &mut StatementReport) -> Result<()> {
        let tx = report.transaction_mut(self.index())?;
        match self {
            Self::Numeric { field, value, .. } => tx.set_amount(*field, *value),
            Self::Text { field, value, .. } => tx.set_text(*field, value.clone()),
        }
        Ok(())
    }
}

/// Partially specified transaction, as proposed by the chat assistant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    #[serde(default)]
    pub transaction_code: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub debit: Option<Amount>,
    #[serde(default)]
    pub credit: Option<Amount>,
    #[serde(default)]
    pub fee: Option<Amount>,
    #[serde(default)]
    pub vat: Option<Amount>,
}

impl TransactionDraft {
    /// Reject provided amounts that are negative or not finite
    pub fn validate(&self) -> Result<()> {
        let amounts = [
            (NumericField::Debit, self.debit),
            (NumericField::Credit, self.credit),
            (NumericField::Fee, self.fee),
            (NumericField::Vat, self.vat),
        ];
        for (field, value) in amounts {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(LedgerError::Parse(format!(
                        "add.{} must be a non-negative number, got {}",
                        field, value
                    )));
                }
            }
        }
        Ok(())
    }

    /// Fill blanks: empty code, today's date, default description, zero amounts
    pub fn into_transaction(self, today: &str) -> Transaction {
        fn text_or(value: Option<String>, default: &str) -> String {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        }
        fn amount_or_zero(value: Option<Amount>) -> Amount {
            value.filter(|v| v.is_finite()).unwrap_or(0.0)
        }

        Transaction {
            transaction_code: Some(text_or(self.transaction_code, "")),
            date: text_or(self.date, today),
            description: text_or(self.description, DEFAULT_TRANSACTION_DESCRIPTION),
            debit: amount_or_zero(self.debit),
            credit: amount_or_zero(self.credit),
            fee: amount_or_zero(self.fee),
            vat: amount_or_zero(self.vat),
        }
    }
}

/// Today's date in statement format
pub fn today_statement_date() -> String {
    chrono::Local::now().format(STATEMENT_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "openingBalance": 1000000,
            "endingBalance": 1188000,
            "accountInfo": {"accountName": "CONG TY ABC", "accountNumber": "0123456789", "bankName": "VCB", "branch": null},
            "transactions": [
                {"transactionCode": "FT001", "date": "01/03/2024", "description": "Thu tien hang", "debit": 200000, "credit": 0},
                {"date": "02/03/2024", "description": "Phi chuyen tien", "debit": 0, "credit": 0, "fee": 10000, "vat": 1000}
            ]
        }"#
    }

    #[test]
    fn test_parse_report_defaults_fee_and_vat() {
        let report = StatementReport::from_json(sample_json()).unwrap();
        assert_eq!(report.transactions.len(), 2);
        assert_eq!(report.transactions[0].fee, 0.0);
        assert_eq!(report.transactions[0].vat, 0.0);
        assert_eq!(report.transactions[1].transaction_code, None);
        assert_eq!(report.account_info.bank_name.as_deref(), Some("VCB"));
    }

    #[test]
    fn test_parse_rejects_missing_transactions() {
        let err = StatementReport::from_json(r#"{"openingBalance": 0, "endingBalance": 0}"#)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Parse(_)));
    }

    #[test]
    fn test_parse_rejects_string_amounts() {
        let json = r#"{"openingBalance": 0, "endingBalance": 0, "transactions": [
            {"date": "01/01/2024", "description": "x", "debit": "100", "credit": 0}
        ]}"#;
        assert!(matches!(StatementReport::from_json(json), Err(LedgerError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_negative_amount() {
        let json = r#"{"openingBalance": 0, "endingBalance": 0, "transactions": [
            {"date": "01/01/2024", "description": "x", "debit": 0, "credit": -5}
        ]}"#;
        let err = StatementReport::from_json(json).unwrap_err();
        assert!(err.to_string().contains("transactions[0].credit"));
    }

    #[test]
    fn test_editable_field_from_str() {
        assert_eq!(
            "vat".parse::<EditableField>().unwrap(),
            EditableField::Numeric(NumericField::Vat)
        );
        assert_eq!(
            "description".parse::<EditableField>().unwrap(),
            EditableField::Text(TextField::Description)
        );
        assert!("balance".parse::<EditableField>().is_err());
    }

    #[test]
    fn test_field_update_out_of_range() {
        let mut report = StatementReport::from_json(sample_json()).unwrap();
        let update = FieldUpdate::Numeric {
            index: 5,
            field: NumericField::Debit,
            value: 1.0,
        };
        assert!(matches!(
            update.apply_to(&mut report),
            Err(LedgerError::TransactionIndex { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_draft_defaults() {
        let draft = TransactionDraft {
            description: Some(String::new()),
            debit: Some(0.0),
            credit: Some(0.0),
            ..Default::default()
        };
        let tx = draft.into_transaction("18/10/2026");
        assert_eq!(tx.description, DEFAULT_TRANSACTION_DESCRIPTION);
        assert_eq!(tx.date, "18/10/2026");
        assert_eq!(tx.transaction_code.as_deref(), Some(""));
        assert_eq!(tx.fee, 0.0);
        assert_eq!(tx.vat, 0.0);
    }

    #[test]
    fn test_numeric_field_serde_names() {
        let field: NumericField = serde_json::from_str("\"debit\"").unwrap();
        assert_eq!(field, NumericField::Debit);
        assert!(serde_json::from_str::<NumericField>("\"description\"").is_err());
    }
}
