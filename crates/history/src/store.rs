//! Persistence backends for history.
//!
//! A store holds the raw JSON array of events; the [`History`] above it owns
//! parsing and ordering. Two backends ship here: an in-process store for
//! dialog contexts that live elsewhere, and a JSON file store.
//!
//! [`History`]: crate::history::History

use slotform_core::HistoryError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Raw event storage: load the whole array, save the whole array.
pub trait HistoryStore: Send {
    fn load(&self) -> Result<serde_json::Value, HistoryError>;
    fn save(&mut self, data: &serde_json::Value) -> Result<(), HistoryError>;
}

/// An in-memory store over a shared JSON slot. The handle can be cloned out
/// to observe saves, or seeded up front to simulate a pre-existing context.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::seeded(serde_json::Value::Null)
    }

    /// A store whose slot already holds raw history data.
    pub fn seeded(data: serde_json::Value) -> Self {
        Self {
            slot: Arc::new(Mutex::new(data)),
        }
    }

    /// Shared handle onto the slot this store reads and writes.
    pub fn handle(&self) -> Arc<Mutex<serde_json::Value>> {
        Arc::clone(&self.slot)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, serde_json::Value>, HistoryError> {
        self.slot
            .lock()
            .map_err(|_| HistoryError::Persistence("history slot lock poisoned".to_string()))
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<serde_json::Value, HistoryError> {
        Ok(self.lock()?.clone())
    }

    fn save(&mut self, data: &serde_json::Value) -> Result<(), HistoryError> {
        *self.lock()? = data.clone();
        Ok(())
    }
}

/// A store backed by one JSON file holding the full event array.
///
/// A missing file reads as empty history; the file is created on first save.
/// An unreadable or unparsable file is a persistence error, not silent data
/// loss.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> Result<serde_json::Value, HistoryError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No history file yet, starting empty");
                return Ok(serde_json::Value::Array(Vec::new()));
            }
            Err(err) => {
                return Err(HistoryError::Persistence(format!(
                    "failed to read history file {}: {err}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&content).map_err(|err| {
            warn!(path = %self.path.display(), error = %err, "History file is not valid JSON");
            HistoryError::Persistence(format!(
                "failed to parse history file {}: {err}",
                self.path.display()
            ))
        })
    }

    fn save(&mut self, data: &serde_json::Value) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                HistoryError::Persistence(format!("failed to create history directory: {err}"))
            })?;
        }
        let content = serde_json::to_string(data)
            .map_err(|err| HistoryError::Persistence(format!("failed to encode history: {err}")))?;
        std::fs::write(&self.path, content).map_err(|err| {
            HistoryError::Persistence(format!(
                "failed to write history file {}: {err}",
                self.path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_store_round_trips_through_the_shared_slot() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_null());

        store.save(&json!([{"name": "a"}])).unwrap();
        assert_eq!(store.load().unwrap(), json!([{"name": "a"}]));
        assert_eq!(*store.handle().lock().unwrap(), json!([{"name": "a"}]));
    }

    #[test]
    fn seeded_memory_store_serves_its_seed() {
        let store = MemoryStore::seeded(json!([{"name": "a", "timestamp": 1}]));
        assert_eq!(store.load().unwrap(), json!([{"name": "a", "timestamp": 1}]));
    }

    #[test]
    fn missing_file_reads_as_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("history.json"));
        assert_eq!(store.load().unwrap(), json!([]));
    }

    #[test]
    fn file_store_round_trips_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctx").join("history.json");
        let mut store = JsonFileStore::new(&path);
        store.save(&json!([{"name": "a", "timestamp": 5}])).unwrap();

        let reloaded = JsonFileStore::new(&path);
        assert_eq!(reloaded.load().unwrap(), json!([{"name": "a", "timestamp": 5}]));
    }

    #[test]
    fn corrupt_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json").unwrap();
        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, HistoryError::Persistence(_)));
    }
}
