//! Spoken cell edits
//!
//! A speech front end yields one transcript per invocation; this module turns
//! it into a `FieldUpdate` for the cell the user was dictating into.

use crate::error::Result;
use crate::models::{Amount, EditableField, FieldUpdate};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?\d+").expect("Invalid regex"));

/// Source of a single spoken transcript
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Capture one utterance. `None` when nothing was heard.
    async fn transcribe(&self) -> Result<Option<String>>;
}

/// Speech input backed by an already-captured transcript
#[derive(Debug, Clone)]
pub struct TranscriptInput(pub String);

#[async_trait]
impl SpeechInput for TranscriptInput {
    async fn transcribe(&self) -> Result<Option<String>> {
        let text = self.0.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}

/// Parse a spoken amount such as "5 triệu" or "200.000".
///
/// Separators and whitespace are dropped, the leading number is read, and a
/// "triệu" (million) or "nghìn"/"ngàn" (thousand) anywhere scales it.
pub fn parse_spoken_amount(transcript: &str) -> Option<Amount> {
    let compact: String = transcript
        .chars()
        .filter(|c| *c != ',' && *c != '.' && !c.is_whitespace())
        .collect();

    let number = LEADING_NUMBER.find(&compact)?;
    let value: Amount = number.as_str().parse().ok()?;

    let lower = transcript.to_lowercase();
    let multiplier = if lower.contains("triệu") {
        1_000_000.0
    } else if lower.contains("nghìn") || lower.contains("ngàn") {
        1_000.0
    } else {
        1.0
    };

    Some(value * multiplier)
}

/// Build the update for one dictated cell. Unparseable amounts yield `None`.
pub fn interpret_transcript(
    index: usize,
    field: EditableField,
    transcript: &str,
) -> Option<FieldUpdate> {
    match field {
        EditableField::Numeric(field) => {
            let value = parse_spoken_amount(transcript)?;
            Some(FieldUpdate::Numeric {
                index,
                field,
                value,
            })
        }
        EditableField::Text(field) => Some(FieldUpdate::Text {
            index,
            field,
            value: transcript.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NumericField, TextField};

    #[test]
    fn test_parse_plain_and_grouped_numbers() {
        assert_eq!(parse_spoken_amount("200000"), Some(200_000.0));
        assert_eq!(parse_spoken_amount("200.000"), Some(200_000.0));
        assert_eq!(parse_spoken_amount("1,500,000 đồng"), Some(1_500_000.0));
    }

    #[test]
    fn test_parse_scaled_words() {
        assert_eq!(parse_spoken_amount("5 triệu"), Some(5_000_000.0));
        assert_eq!(parse_spoken_amount("300 nghìn"), Some(300_000.0));
        assert_eq!(parse_spoken_amount("300 Ngàn"), Some(300_000.0));
    }

    #[test]
    fn test_parse_rejects_non_numbers() {
        assert_eq!(parse_spoken_amount("năm triệu"), None);
        assert_eq!(parse_spoken_amount(""), None);
    }

    #[test]
    fn test_interpret_numeric_and_text() {
        assert_eq!(
            interpret_transcript(1, EditableField::Numeric(NumericField::Fee), "11 nghìn"),
            Some(FieldUpdate::Numeric {
                index: 1,
                field: NumericField::Fee,
                value: 11_000.0
            })
        );
        assert_eq!(
            interpret_transcript(0, EditableField::Text(TextField::Description), "Phí SMS"),
            Some(FieldUpdate::Text {
                index: 0,
                field: TextField::Description,
                value: "Phí SMS".to_string()
            })
        );
        assert_eq!(
            interpret_transcript(0, EditableField::Numeric(NumericField::Debit), "không rõ"),
            None
        );
    }

    #[tokio::test]
    async fn test_transcript_input() {
        assert_eq!(
            TranscriptInput(" 5 triệu ".to_string()).transcribe().await.unwrap(),
            Some("5 triệu".to_string())
        );
        assert_eq!(TranscriptInput("  ".to_string()).transcribe().await.unwrap(), None);
    }
}
