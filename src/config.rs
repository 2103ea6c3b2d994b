//! Runtime configuration
//!
//! Every value has a working default; environment variables (optionally from
//! a `.env` file loaded at startup) override them.

use std::path::PathBuf;

/// Default scale applied when rasterizing PDF pages
pub const DEFAULT_PDF_RENDER_SCALE: f32 = 2.5;

/// Chat-completions provider settings
#[derive(Debug, Clone, PartialEq)]
pub struct DeepSeekConfig {
    /// Base URL for API (default: https://api.deepseek.com)
    pub base_url: String,

    /// Model to use (default: deepseek-chat)
    pub model: String,

    /// Sampling temperature for analysis and chat
    pub temperature: f32,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            temperature: 0.1,
        }
    }
}

/// Vision / structured-generation provider settings
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    /// Base URL for API (default: https://generativelanguage.googleapis.com/v1beta)
    pub base_url: String,

    /// Model to use (default: gemini-2.5-flash)
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub deepseek: DeepSeekConfig,
    pub gemini: GeminiConfig,

    /// PDF page rasterization scale factor
    pub pdf_render_scale: f32,

    /// Override for the persisted key-value store location
    pub store_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            deepseek: DeepSeekConfig::default(),
            gemini: GeminiConfig::default(),
            pdf_render_scale: DEFAULT_PDF_RENDER_SCALE,
            store_path: None,
        }
    }
}

impl AppConfig {
    /// Build from process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = Self::default();

        if let Some(url) = non_empty("DEEPSEEK_BASE_URL") {
            config.deepseek.base_url = url;
        }
        if let Some(model) = non_empty("DEEPSEEK_MODEL") {
            config.deepseek.model = model;
        }
        if let Some(url) = non_empty("GEMINI_BASE_URL") {
            config.gemini.base_url = url;
        }
        if let Some(model) = non_empty("GEMINI_MODEL") {
            config.gemini.model = model;
        }
        if let Some(raw) = non_empty("PDF_RENDER_SCALE") {
            match raw.parse::<f32>() {
                Ok(scale) if scale.is_finite() && scale > 0.0 => config.pdf_render_scale = scale,
                _ => tracing::warn!(
                    "[Config] Ignoring invalid PDF_RENDER_SCALE={}, using {}",
                    raw,
                    DEFAULT_PDF_RENDER_SCALE
                ),
            }
        }
        config.store_path = non_empty("STATEMENT_LEDGER_STORE").map(PathBuf::from);

        config
    }
}
