//! Response cleanup shared by both providers.

use crate::error::{LedgerError, Result};

/// Remove ```json / ``` fences and surrounding whitespace
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Extract a JSON object from a response that might contain markdown or chatter
///
/// Handles:
/// - ```json code blocks
/// - Plain ``` code blocks
/// - Raw JSON objects surrounded by prose
pub fn extract_json_object(text: &str) -> Result<String> {
    let cleaned = strip_code_fences(text);
    if cleaned.starts_with('{') && cleaned.ends_with('}') {
        return Ok(cleaned);
    }

    if let Some(start) = cleaned.find('{') {
        if let Some(end) = cleaned.rfind('}') {
            if end > start {
                return Ok(cleaned[start..=end].to_string());
            }
        }
    }

    Err(LedgerError::Parse("No JSON object found in response".to_string()))
}

/// Parse a provider payload into a typed value, fences tolerated
pub fn parse_json_payload<T: serde::de::DeserializeOwned>(text: &str) -> Result<T> {
    let json = extract_json_object(text)?;
    serde_json::from_str(&json).map_err(LedgerError::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_json_object_from_prose() {
        let text = r#"Here is the ledger: {"name": "test"} done"#;
        assert_eq!(extract_json_object(text).unwrap(), r#"{"name": "test"}"#);
    }

    #[test]
    fn test_no_json_returns_parse_error() {
        assert!(matches!(
            extract_json_object("No JSON here!"),
            Err(LedgerError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_json_payload_reports_shape_errors() {
        #[derive(serde::Deserialize, Debug)]
        struct Shape {
            #[allow(dead_code)]
            value: u32,
        }
        assert!(parse_json_payload::<Shape>("```json\n{\"value\": 3}\n```").is_ok());
        assert!(matches!(
            parse_json_payload::<Shape>("{\"value\": \"three\"}"),
            Err(LedgerError::Parse(_))
        ));
    }
}
