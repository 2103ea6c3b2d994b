//! Error taxonomy shared by every component.

use thiserror::Error;

/// Errors surfaced by extraction, provider calls, and ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No usable API key for a provider
    #[error("Missing API key for {0}")]
    MissingCredential(&'static str),

    /// Provider answered with a non-success status
    #[error("{provider} API error ({status}): {message}")]
    ProviderHttp {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// Provider call succeeded but returned nothing to work with
    #[error("{0} returned an empty response")]
    EmptyResponse(&'static str),

    /// Provider payload was not the expected JSON shape
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A file in the batch could not be extracted
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Request never got a status back
    #[error("{provider} request failed: {message}")]
    Network {
        provider: &'static str,
        message: String,
    },

    #[error("No statement report is loaded")]
    EmptyLedger,

    #[error("Transaction index {index} out of range ({len} transactions)")]
    TransactionIndex { index: usize, len: usize },

    #[error("No chat mutation is awaiting confirmation")]
    NoPendingMutation,

    #[error("Statement content is empty")]
    EmptyStatement,

    #[error("Store error: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    /// Wrap any displayable failure as a parse error
    pub fn parse(err: impl std::fmt::Display) -> Self {
        Self::Parse(err.to_string())
    }

    /// Wrap any displayable failure as an extraction error
    pub fn extraction(err: impl std::fmt::Display) -> Self {
        Self::Extraction(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_http_message() {
        let err = LedgerError::ProviderHttp {
            provider: "DeepSeek",
            status: 401,
            message: "Authentication Fails".to_string(),
        };
        assert_eq!(err.to_string(), "DeepSeek API error (401): Authentication Fails");
    }

    #[test]
    fn test_parse_helper() {
        let err = LedgerError::parse("expected value at line 1 column 1");
        assert!(matches!(err, LedgerError::Parse(_)));
    }
}
