use crate::error::{LedgerError, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "com.statement-ledger.app";

/// AI providers that need an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Chat-completions provider used for analysis and chat
    DeepSeek,
    /// Vision provider, also the fallback for analysis and chat
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Gemini => "gemini",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::DeepSeek => "DeepSeek",
            ProviderKind::Gemini => "Gemini",
        }
    }

    /// Environment variables checked, in order
    fn env_vars(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::DeepSeek => &["DEEPSEEK_API_KEY", "VITE_DEEPSEEK_API_KEY"],
            ProviderKind::Gemini => &["GEMINI_API_KEY", "VITE_API_KEY", "API_KEY"],
        }
    }
}

/// Credential manager using the OS keychain with environment fallback
pub struct CredentialManager;

impl CredentialManager {
    /// Store an API key in the OS keychain
    pub fn store_api_key(provider: ProviderKind, api_key: &str) -> Result<()> {
        if !is_usable_key(api_key) {
            return Err(LedgerError::MissingCredential(provider.display_name()));
        }

        let entry = Entry::new(SERVICE_NAME, provider.as_str())
            .map_err(|e| LedgerError::Store(format!("Keychain unavailable: {}", e)))?;
        entry
            .set_password(api_key)
            .map_err(|e| LedgerError::Store(format!("Failed to store API key: {}", e)))?;

        tracing::info!("[Credentials] Stored API key in keychain for: {}", provider.as_str());
        Ok(())
    }

    /// Get an API key from the keychain, then from the environment
    pub fn get_api_key(provider: ProviderKind) -> Option<String> {
        if let Ok(entry) = Entry::new(SERVICE_NAME, provider.as_str()) {
            if let Ok(password) = entry.get_password() {
                if is_usable_key(&password) {
                    tracing::debug!("[Credentials] Using keychain key for: {}", provider.as_str());
                    return Some(password);
                }
            }
        }

        let key = provider
            .env_vars()
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| is_usable_key(value));

        if key.is_none() {
            tracing::warn!(
                "[Credentials] No API key for {} (set {})",
                provider.display_name(),
                provider.env_vars().join(" or ")
            );
        }

        key
    }

    /// Delete an API key from the keychain. A missing entry is not an error.
    pub fn delete_api_key(provider: ProviderKind) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, provider.as_str())
            .map_err(|e| LedgerError::Store(format!("Keychain unavailable: {}", e)))?;
        if deletion_outcome(entry.delete_credential())? {
            tracing::info!("[Credentials] Deleted API key from keychain for: {}", provider.as_str());
        }
        Ok(())
    }

    /// Check if an API key is configured
    pub fn has_api_key(provider: ProviderKind) -> bool {
        Self::get_api_key(provider).is_some()
    }
}

/// Whether a keychain entry was removed; `NoEntry` means there was nothing to delete
fn deletion_outcome(result: keyring::Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(e) => Err(LedgerError::Store(format!("Failed to delete API key: {}", e))),
    }
}

/// Blank keys and build-time placeholders such as "undefined" are not keys
pub fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && !key.contains("undefined")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_usable_key() {
        assert!(is_usable_key("sk-abc123"));
        assert!(!is_usable_key(""));
        assert!(!is_usable_key("   "));
        assert!(!is_usable_key("undefined"));
        assert!(!is_usable_key("\"undefined\""));
    }

    #[test]
    fn test_deletion_outcome() {
        assert!(deletion_outcome(Ok(())).unwrap());
        assert!(!deletion_outcome(Err(keyring::Error::NoEntry)).unwrap());
        assert!(matches!(
            deletion_outcome(Err(keyring::Error::PlatformFailure("locked".into()))),
            Err(LedgerError::Store(_))
        ));
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(ProviderKind::DeepSeek.as_str(), "deepseek");
        assert_eq!(ProviderKind::Gemini.display_name(), "Gemini");
        assert!(ProviderKind::Gemini.env_vars().contains(&"VITE_API_KEY"));
    }
}
