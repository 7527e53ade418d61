//! Storage layer for taskboard
//!
//! The board persists through a small key-value seam so the backing store
//! can be swapped (a JSON file on disk for the CLI, an in-memory map for
//! tests). The [`PersistenceGateway`] sits on top and owns the task
//! serialization format.
//!
//! # On-disk layout
//!
//! ```text
//! <data_dir>/
//!   store.json        # {"kanbanTasks": "[{\"id\":1,...}]"}
//!   store.json.lock   # fs2 lock guarding read-modify-write
//! ```
//!
//! The value under the task key is itself a JSON string, mirroring a
//! string-only key-value store.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::lock::{StoreLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::task::Task;

/// Key the task collection is stored under
pub const DEFAULT_TASKS_KEY: &str = "kanbanTasks";

/// File name of the on-disk store inside the data directory
pub const STORE_FILE: &str = "store.json";

/// String key-value store the gateway persists through
pub trait KeyValueStore {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<()>;
}

// =========================================================================
// File-backed store
// =========================================================================

/// Key-value store backed by a single JSON object file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    /// Wait at most `timeout_ms` for another writer to let go
    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    fn parse_map(content: &str) -> Result<BTreeMap<String, String>> {
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(content)?)
    }

    /// Apply `edit` to the stored map under the lock and write it back
    fn modify<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let lock = StoreLock::acquire(&self.path, self.lock_timeout_ms)?;
        let mut map = match lock.read()? {
            Some(content) => match Self::parse_map(&content) {
                Ok(map) => map,
                Err(err) => {
                    // An unreadable container holds nothing we can keep.
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %err,
                        "store file is not a JSON object; starting fresh"
                    );
                    BTreeMap::new()
                }
            },
            None => BTreeMap::new(),
        };
        edit(&mut map);
        let json = serde_json::to_string_pretty(&map)?;
        lock.replace(json.as_bytes())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(Error::Io(err)),
        };
        let mut map = Self::parse_map(&content)?;
        Ok(map.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.modify(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.modify(|map| {
            map.remove(key);
        })
    }
}

// =========================================================================
// In-memory store
// =========================================================================

/// Key-value store held in process memory
///
/// An optional quota (in bytes, per value) makes writes fail the way a
/// full browser storage area would.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(quota),
        }
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(quota) = self.quota {
            if value.len() > quota {
                return Err(Error::OperationFailed(format!(
                    "storage quota exceeded ({} > {quota} bytes)",
                    value.len()
                )));
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// =========================================================================
// Persistence gateway
// =========================================================================

/// Serializes the task collection into a key-value store
///
/// Persistence is best-effort: nothing here returns an error to the
/// caller. Write failures are logged and the in-memory collection stays
/// authoritative; unreadable data is erased so later loads start clean.
pub struct PersistenceGateway {
    store: Box<dyn KeyValueStore>,
    key: String,
    last_save_error: Option<String>,
}

impl PersistenceGateway {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_TASKS_KEY)
    }

    pub fn with_key(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            last_save_error: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read-only access to the backing store
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Write the full collection under the task key
    pub fn save(&mut self, tasks: &[Task]) {
        let result = serde_json::to_string(tasks)
            .map_err(Error::from)
            .and_then(|json| self.store.set(&self.key, &json));
        match result {
            Ok(()) => {
                tracing::debug!(key = %self.key, count = tasks.len(), "tasks saved");
                self.last_save_error = None;
            }
            Err(err) => {
                tracing::error!(key = %self.key, error = %err, "failed to save tasks");
                self.last_save_error = Some(err.to_string());
            }
        }
    }

    /// Why the most recent `save` failed, cleared by the next good one
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Read the collection back, `None` when absent or unusable
    pub fn load(&mut self) -> Option<Vec<Task>> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::error!(key = %self.key, error = %err, "failed to read tasks");
                self.clear();
                return None;
            }
        };

        match decode_tasks(&raw) {
            Ok(tasks) => {
                tracing::debug!(key = %self.key, count = tasks.len(), "tasks loaded");
                Some(tasks)
            }
            Err(reason) => {
                tracing::warn!(key = %self.key, %reason, "discarding unreadable tasks");
                self.clear();
                None
            }
        }
    }

    /// Remove the stored collection
    pub fn clear(&mut self) {
        if let Err(err) = self.store.remove(&self.key) {
            tracing::error!(key = %self.key, error = %err, "failed to clear tasks");
        }
    }
}

/// Parse and shape-check a stored collection
fn decode_tasks(raw: &str) -> std::result::Result<Vec<Task>, String> {
    let tasks: Vec<Task> = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if !seen.insert(task.id) {
            return Err(format!("duplicate task id {}", task.id));
        }
    }
    Ok(tasks)
}

/// Resolve the store file path: explicit path, configured path, then the
/// platform data directory.
pub fn resolve_store_path(explicit: Option<&Path>, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit.or(configured) {
        return Ok(path.to_path_buf());
    }
    let dirs = directories::ProjectDirs::from("", "", "taskboard").ok_or_else(|| {
        Error::OperationFailed("could not determine a data directory".to_string())
    })?;
    Ok(dirs.data_dir().join(STORE_FILE))
}
