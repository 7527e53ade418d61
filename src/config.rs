//! Configuration loading and management
//!
//! Handles parsing of `taskboard.toml` configuration files.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::board::strip_count_annotation;
use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::storage::DEFAULT_TASKS_KEY;

/// Name of the configuration file
pub const CONFIG_FILE: &str = "taskboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Board presentation
    #[serde(default)]
    pub board: BoardConfig,

    /// Seeding of new boards
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Where and under which key the board is stored
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Store file; defaults to the platform data directory
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Key the task collection is stored under
    #[serde(default = "default_key")]
    pub key: String,

    /// How long a write waits for another process to release the store
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_key() -> String {
    DEFAULT_TASKS_KEY.to_string()
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: default_key(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Column labels
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    #[serde(default = "default_todo_label")]
    pub todo_label: String,

    #[serde(default = "default_doing_label")]
    pub doing_label: String,

    #[serde(default = "default_done_label")]
    pub done_label: String,
}

fn default_todo_label() -> String {
    "To Do".to_string()
}

fn default_doing_label() -> String {
    "In Progress".to_string()
}

fn default_done_label() -> String {
    "Done".to_string()
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            todo_label: default_todo_label(),
            doing_label: default_doing_label(),
            done_label: default_done_label(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Seed sample tasks when no board is stored
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, or the platform config directory
    ///
    /// An explicit path must exist and parse. The platform file is
    /// optional; when it is missing or invalid the defaults apply.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        match Self::load(&path) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.storage.key.trim().is_empty() {
            return Err(Error::InvalidConfig("storage.key cannot be empty".to_string()));
        }
        if self.storage.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "storage.lock_timeout_ms must be greater than zero".to_string(),
            ));
        }
        for (field, label) in [
            ("board.todo_label", &self.board.todo_label),
            ("board.doing_label", &self.board.doing_label),
            ("board.done_label", &self.board.done_label),
        ] {
            if label.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{field} cannot be empty")));
            }
            // Headers append " (<n>)"; a label already ending that way would lose it.
            if strip_count_annotation(label) != label.as_str() {
                return Err(Error::InvalidConfig(format!(
                    "{field} cannot end with a count like \" (2)\""
                )));
            }
        }
        Ok(())
    }
}

/// `<config_dir>/taskboard.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "taskboard")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}
