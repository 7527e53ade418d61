#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A store file and config file in a private temp directory
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("taskboard.toml"), "")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("store.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("taskboard.toml")
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<()> {
        fs::write(self.config_path(), contents)
    }

    /// `taskboard` pointed at this board's store and config
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskboard").expect("binary");
        cmd.env_remove("TASKBOARD_STORE")
            .env_remove("TASKBOARD_CONFIG")
            .env_remove("RUST_LOG")
            .env_remove("TASKBOARD_LOG_FILE")
            .arg("--store")
            .arg(self.store_path())
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

/// Parse the JSON envelope a `--json` command printed
pub fn envelope(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("json envelope")
}
