//! taskboard - Kanban Task Board Library
//!
//! This library provides the core of the taskboard CLI: a three-column
//! board (todo, doing, done) whose tasks persist locally between runs.
//!
//! # Core Concepts
//!
//! - **Task Store**: the owned task collection; every mutation persists
//!   the whole collection and re-renders
//! - **Persistence Gateway**: JSON (de)serialization over a string
//!   key-value store, with recovery from corrupt entries
//! - **Board**: the three columns with per-column counts
//! - **Editor Session**: create/edit/delete interaction with title
//!   validation
//!
//! # Module Organization
//!
//! - `board`: column projection of the task collection
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `taskboard.toml`
//! - `error`: Error types and result aliases
//! - `lock`: File locking and atomic writes
//! - `logging`: Where tracing output goes for each run
//! - `output`: Human and JSON output for commands
//! - `storage`: Key-value stores and the persistence gateway
//! - `task`: Task model and the task store
//! - `ui`: Interactive terminal board and editor

pub mod board;
pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod logging;
pub mod output;
pub mod storage;
pub mod task;
pub mod ui;

pub use error::{Error, Result};
