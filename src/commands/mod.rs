//! Host-facing operations.
//!
//! Every operation takes the shared `AppState` and returns `Result<T, String>`
//! so a front end can display failures as-is. The session lock is never held
//! across a provider call; the last response to come back wins.

pub mod chat;
pub mod statement;

pub use chat::*;
pub use statement::*;

use crate::ai::StatementOrchestrator;
use crate::chat::ChatHandler;
use crate::config::AppConfig;
use crate::error::Result;
use crate::extraction::{ContentExtractor, FileBlob};
use crate::history::{JsonFileStore, KeyValueStore, MemoryStore};
use crate::ledger::LedgerSession;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mutable per-user state
pub struct Workspace {
    pub ledger: LedgerSession,
    pub chat: ChatHandler,
    /// Files of the current selection, kept until the next selection
    pub files: Vec<FileBlob>,
}

/// Shared application state
pub struct AppState {
    pub workspace: Mutex<Workspace>,
    pub extractor: ContentExtractor,
    pub orchestrator: StatementOrchestrator,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        extractor: ContentExtractor,
        orchestrator: StatementOrchestrator,
    ) -> Self {
        Self {
            workspace: Mutex::new(Workspace {
                ledger: LedgerSession::new(store),
                chat: ChatHandler::new(),
                files: Vec::new(),
            }),
            extractor,
            orchestrator,
        }
    }

    /// Real store, rasterizer and providers
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            open_store(config),
            ContentExtractor::from_config(config),
            StatementOrchestrator::from_config(config),
        )
    }
}

/// File store when one can be opened, otherwise an in-memory store for this run
fn open_store(config: &AppConfig) -> Arc<dyn KeyValueStore> {
    let opened: Result<JsonFileStore> = match &config.store_path {
        Some(path) => JsonFileStore::open(path),
        None => JsonFileStore::new(),
    };

    match opened {
        Ok(store) => {
            tracing::info!("[Store] Using {}", store.path().display());
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!("[Store] {}; statement input will not persist this run", e);
            Arc::new(MemoryStore::new())
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::ai::{
        CompletionMessage, CompletionOptions, CompletionProvider, GenerationProvider,
        GenerationRequest,
    };
    use crate::error::LedgerError;
    use crate::extraction::Rasterizer;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider answering from a queue of payloads; `None` or an empty
    /// queue fails the call
    pub struct ScriptedProvider {
        replies: std::sync::Mutex<VecDeque<Option<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        pub fn new(replies: &[Option<&str>]) -> Arc<Self> {
            Arc::new(Self {
                replies: std::sync::Mutex::new(
                    replies.iter().map(|r| r.map(str::to_string)).collect(),
                ),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn answer(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.replies.lock().unwrap().pop_front().flatten();
            next.ok_or(LedgerError::ProviderHttp {
                provider: "Scripted",
                status: 503,
                message: "unavailable".to_string(),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "Scripted"
        }

        async fn complete(
            &self,
            _messages: &[CompletionMessage],
            _options: CompletionOptions,
        ) -> Result<String> {
            self.answer()
        }
    }

    #[async_trait]
    impl GenerationProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "Scripted"
        }

        async fn generate(&self, _request: GenerationRequest) -> Result<String> {
            self.answer()
        }
    }

    pub struct NoPdf;

    impl Rasterizer for NoPdf {
        fn rasterize(&self, _pdf_bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
            Err(LedgerError::extraction("no rendering surface"))
        }
    }

    pub fn state_with(
        primary: Arc<ScriptedProvider>,
        vision: Arc<ScriptedProvider>,
    ) -> AppState {
        AppState::new(
            Arc::new(MemoryStore::new()),
            ContentExtractor::new(Arc::new(NoPdf)),
            StatementOrchestrator::new(primary, vision, 0.1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::FILE_NAME_KEY;
    use tempfile::tempdir;

    #[test]
    fn test_store_falls_back_to_memory_when_unopenable() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let config = AppConfig {
            store_path: Some(blocker.join("store.json")),
            ..Default::default()
        };
        let store = open_store(&config);
        store.save(FILE_NAME_KEY, "sao-ke.pdf").unwrap();
        assert_eq!(store.load(FILE_NAME_KEY).as_deref(), Some("sao-ke.pdf"));
        assert!(!blocker.join("store.json").exists());
    }

    #[test]
    fn test_store_opens_configured_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let config = AppConfig {
            store_path: Some(path.clone()),
            ..Default::default()
        };
        open_store(&config).save(FILE_NAME_KEY, "a.pdf").unwrap();
        assert!(path.exists());
    }
}
