//! Response schemas in the Gemini OpenAPI-subset dialect
//!
//! Field names and required-ness mirror the serde shapes in `models` and
//! `chat::directive`; a payload that satisfies these schemas deserializes.

use serde_json::{json, Value};

fn transaction_properties() -> Value {
    json!({
        "transactionCode": { "type": "STRING" },
        "date": { "type": "STRING", "description": "DD/MM/YYYY" },
        "description": { "type": "STRING" },
        "debit": { "type": "NUMBER", "description": "Money in (statement C)" },
        "credit": { "type": "NUMBER", "description": "Money out principal, excluding fee and VAT (statement D)" },
        "fee": { "type": "NUMBER" },
        "vat": { "type": "NUMBER" }
    })
}

/// Schema for a full `StatementReport`
pub fn statement_report_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "openingBalance": { "type": "NUMBER" },
            "endingBalance": { "type": "NUMBER" },
            "accountInfo": {
                "type": "OBJECT",
                "properties": {
                    "accountName": { "type": "STRING" },
                    "accountNumber": { "type": "STRING" },
                    "bankName": { "type": "STRING" },
                    "branch": { "type": "STRING" }
                }
            },
            "transactions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": transaction_properties(),
                    "required": ["date", "description", "debit", "credit", "fee", "vat"]
                }
            }
        },
        "required": ["openingBalance", "endingBalance", "accountInfo", "transactions"]
    })
}

/// Schema for a `ChatMutationDirective`
pub fn chat_directive_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "responseText": { "type": "STRING" },
            "action": {
                "type": "STRING",
                "enum": ["update", "undo", "add", "query"]
            },
            "update": {
                "type": "OBJECT",
                "nullable": true,
                "properties": {
                    "index": { "type": "INTEGER" },
                    "field": {
                        "type": "STRING",
                        "enum": ["debit", "credit", "fee", "vat"]
                    },
                    "newValue": { "type": "NUMBER" }
                },
                "required": ["index", "field", "newValue"]
            },
            "add": {
                "type": "OBJECT",
                "nullable": true,
                "properties": transaction_properties()
            },
            "confirmationRequired": { "type": "BOOLEAN" }
        },
        "required": ["responseText", "action", "confirmationRequired"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_schema_requires_amount_columns() {
        let schema = statement_report_schema();
        let required = &schema["properties"]["transactions"]["items"]["required"];
        for field in ["debit", "credit", "fee", "vat"] {
            assert!(required.as_array().unwrap().iter().any(|v| v == field));
        }
    }

    #[test]
    fn test_directive_schema_enumerates_actions() {
        let schema = chat_directive_schema();
        assert_eq!(
            schema["properties"]["action"]["enum"],
            json!(["update", "undo", "add", "query"])
        );
        assert_eq!(schema["properties"]["update"]["nullable"], true);
    }
}
