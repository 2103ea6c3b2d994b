//! Persistence port for the raw statement text and display filename.

use crate::error::{LedgerError, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key for the extracted or pasted statement text
pub const STATEMENT_CONTENT_KEY: &str = "statementContent";

/// Key for the display name of the selected files
pub const FILE_NAME_KEY: &str = "fileName";

/// Store filename inside the config directory
const STORE_FILENAME: &str = "store.json";

/// Plain string key-value persistence
pub trait KeyValueStore: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// JSON file store.
///
/// Lives at `~/.config/statement-ledger/store.json` unless a path is given.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store in the default config directory
    pub fn new() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| LedgerError::Store("Failed to get config directory".to_string()))?
            .join("statement-ledger");
        Self::open(dir.join(STORE_FILENAME))
    }

    /// Open (or lazily create) a store at a specific path.
    ///
    /// An unreadable or corrupt file is replaced on the next save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let entries = if path.exists() {
            Self::read_entries(&path).unwrap_or_else(|e| {
                tracing::warn!("[Store] Starting empty: {}", e);
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        tracing::debug!("[Store] Opened {} ({} keys)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| LedgerError::Store(format!("Corrupt store {}: {}", path.display(), e)))
    }

    /// Atomically write JSON to the store file
    fn atomic_write(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let temp_path = self.path.with_extension("tmp");

        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, entries)
            .map_err(|e| LedgerError::Store(format!("Failed to serialize: {}", e)))?;

        writer.flush()?;
        writer.get_ref().sync_all()?;

        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        entries.get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| LedgerError::Store("Store lock poisoned".to_string()))?;

        if entries.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }

        entries.insert(key.to_string(), value.to_string());
        self.atomic_write(&entries)
    }
}

/// Volatile store, for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| LedgerError::Store("Store lock poisoned".to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_round_trip_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.load(FILE_NAME_KEY), None);
        store.save(FILE_NAME_KEY, "sao-ke-thang-3.pdf").unwrap();
        store.save(STATEMENT_CONTENT_KEY, "So du dau ky: 1.000.000").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.load(FILE_NAME_KEY).as_deref(), Some("sao-ke-thang-3.pdf"));
        assert_eq!(
            reopened.load(STATEMENT_CONTENT_KEY).as_deref(),
            Some("So du dau ky: 1.000.000")
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_corrupt_store_starts_empty_and_recovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.load(FILE_NAME_KEY), None);

        store.save(FILE_NAME_KEY, "sao-ke.pdf").unwrap();
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.load(FILE_NAME_KEY).as_deref(), Some("sao-ke.pdf"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.save("k", "v").unwrap();
        assert_eq!(store.load("k").as_deref(), Some("v"));
        assert_eq!(store.load("missing"), None);
    }
}
