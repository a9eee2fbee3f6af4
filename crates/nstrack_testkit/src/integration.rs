//! Cross-crate integration test helpers.
//!
//! [`StoreHarness`] wraps a [`HistoryStore`] and remembers what each run
//! should contain, so tests can store, clear and reopen freely and then ask
//! for a single consistency check.

use nstrack_core::{HistoryStore, StarHistory, LOG_FILE_NAME};
use nstrack_storage::FileBackend;
use std::collections::BTreeMap;
use std::path::Path;
use tempfile::TempDir;

/// A history store plus the histories each run is expected to hold.
pub struct StoreHarness {
    /// The store under test.
    pub store: HistoryStore,
    expected: BTreeMap<String, Vec<StarHistory>>,
    temp_dir: Option<TempDir>,
}

impl StoreHarness {
    /// Creates a harness over an in-memory store.
    pub fn memory() -> Self {
        Self {
            store: HistoryStore::in_memory(),
            expected: BTreeMap::new(),
            temp_dir: None,
        }
    }

    /// Creates a harness over a file-backed store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = open_file_store(temp_dir.path());
        Self {
            store,
            expected: BTreeMap::new(),
            temp_dir: Some(temp_dir),
        }
    }

    /// Stores `histories` under `run` and tracks them.
    pub fn store(&mut self, run: &str, histories: &[StarHistory]) {
        self.store
            .store(run, histories)
            .expect("Failed to store histories");
        self.expected
            .entry(run.to_string())
            .or_default()
            .extend_from_slice(histories);
    }

    /// Clears `run` and stops tracking it.
    pub fn clear(&mut self, run: &str) {
        self.store.clear(run).expect("Failed to clear run");
        self.expected.remove(run);
    }

    /// Closes and reopens a file-backed store. No-op for in-memory stores.
    pub fn reopen(&mut self) {
        if let Some(dir) = &self.temp_dir {
            // release the file lock before opening again
            self.store = HistoryStore::in_memory();
            self.store = open_file_store(dir.path());
        }
    }

    /// Path of the history log, if file-backed.
    pub fn log_path(&self) -> Option<std::path::PathBuf> {
        self.temp_dir.as_ref().map(|dir| dir.path().join(LOG_FILE_NAME))
    }

    /// Asserts every tracked run loads exactly as stored.
    pub fn verify(&self) {
        for (run, expected) in &self.expected {
            let loaded = self.store.load(&[run]).expect("Failed to load run");
            assert_eq!(&loaded, expected, "histories of run {run} differ");
        }

        let stored: Vec<String> = self.store.runs().into_iter().map(|run| run.name).collect();
        let tracked: Vec<String> = self
            .expected
            .iter()
            .filter(|(_, histories)| !histories.is_empty())
            .map(|(run, _)| run.clone())
            .collect();
        assert_eq!(stored, tracked, "stored run names differ");
    }
}

fn open_file_store(dir: &Path) -> HistoryStore {
    let backend = FileBackend::open_with_create_dirs(&dir.join(LOG_FILE_NAME))
        .expect("Failed to open history log");
    HistoryStore::open(Box::new(backend)).expect("Failed to open history store")
}
