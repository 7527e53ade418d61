//! Tracing setup for the `taskboard` binary
//!
//! Logging is opt-in through `RUST_LOG`. Command output owns stdout, so
//! logs normally go to stderr. The interactive board draws over the whole
//! terminal, so there logs go to `TASKBOARD_LOG_FILE` when it is set and
//! are dropped otherwise.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable naming a file to append logs to
pub const LOG_FILE_ENV: &str = "TASKBOARD_LOG_FILE";

/// Longest `RUST_LOG` value we are willing to parse
const MAX_FILTER_LEN: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Discard,
    Stderr,
    File(PathBuf),
}

/// Pick where logs go for this run
pub fn log_target(interactive: bool, log_file: Option<PathBuf>) -> LogTarget {
    match log_file {
        Some(path) => LogTarget::File(path),
        None if interactive => LogTarget::Discard,
        None => LogTarget::Stderr,
    }
}

/// Parse a `RUST_LOG` value; blank, oversized or invalid filters disable logging
pub fn env_filter(raw: Option<&str>) -> Option<EnvFilter> {
    let raw = raw?.trim();
    if raw.is_empty() || raw.len() > MAX_FILTER_LEN {
        return None;
    }
    EnvFilter::try_new(raw).ok()
}

/// Install the global subscriber
pub fn init(interactive: bool) {
    let Some(filter) = env_filter(std::env::var("RUST_LOG").ok().as_deref()) else {
        return;
    };
    let target = log_target(interactive, std::env::var_os(LOG_FILE_ENV).map(PathBuf::from));

    let result = match target {
        LogTarget::Discard => return,
        LogTarget::Stderr => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .try_init(),
        LogTarget::File(path) => {
            let file = match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => file,
                Err(err) => {
                    if !interactive {
                        eprintln!("warning: cannot open log file {}: {err}", path.display());
                    }
                    return;
                }
            };
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(filter)
                .try_init()
        }
    };
    if let Err(err) = result {
        if !interactive {
            eprintln!("warning: logging disabled: {err}");
        }
    }
}
