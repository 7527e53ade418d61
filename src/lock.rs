//! Cross-process locking for the store file
//!
//! A writer holds an exclusive fs2 lock on the sidecar `<file>.lock` while
//! it reads the store and replaces it through a temp file and a rename.
//! Writers queue on the lock and the last one wins. Readers never see a
//! half-written file.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

/// How long a writer waits for the lock unless configured otherwise
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

const RETRY_EVERY: Duration = Duration::from_millis(25);

/// `<target>.lock`
pub fn sidecar_path(target: &Path) -> PathBuf {
    with_suffix(target, ".lock")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Exclusive hold on a store file, released on drop
#[derive(Debug)]
pub struct StoreLock {
    target: PathBuf,
    sidecar: File,
}

impl StoreLock {
    /// Wait up to `timeout_ms` for the lock guarding `target`
    ///
    /// Creates the parent directory and the sidecar file when missing.
    /// Gives up with `Error::LockFailed` naming the sidecar.
    pub fn acquire(target: impl Into<PathBuf>, timeout_ms: u64) -> Result<Self> {
        let target = target.into();
        let lock_path = sidecar_path(&target);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let sidecar = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            match sidecar.try_lock_exclusive() {
                Ok(()) => return Ok(Self { target, sidecar }),
                Err(err) if !is_contended(&err) => return Err(Error::Io(err)),
                Err(_) if Instant::now() >= deadline => {
                    tracing::warn!(lock = %lock_path.display(), timeout_ms, "store lock timed out");
                    return Err(Error::LockFailed(lock_path));
                }
                Err(_) => thread::sleep(RETRY_EVERY),
            }
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Current contents of the store, `None` before the first write
    pub fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.target) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }

    /// Replace the store with `data` via a temp sibling and a rename
    pub fn replace(&self, data: &[u8]) -> Result<()> {
        let temp = with_suffix(&self.target, &format!(".tmp.{}", std::process::id()));
        let mut file = File::create(&temp)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp, &self.target)?;
        Ok(())
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.sidecar);
    }
}
