//! Command-line interface for taskboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Running without a subcommand opens the interactive board.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;

mod board;
mod task;

/// taskboard - a three-column Kanban board for the terminal
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Store file (defaults to the platform data directory)
    #[arg(long, global = true, env = "TASKBOARD_STORE")]
    pub store: Option<PathBuf>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "TASKBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive board (default)
    Board,

    /// Show the board columns with their tasks
    List {
        /// Only show one column: todo, doing or done
        #[arg(long)]
        status: Option<String>,
    },

    /// Create a task
    Add {
        /// Task title
        title: String,

        /// Free-form description
        #[arg(long, short = 'd', default_value = "")]
        description: String,

        /// Initial column: todo, doing or done
        #[arg(long, short = 's', default_value = "todo")]
        status: String,
    },

    /// Change a task; omitted fields keep their current values
    Edit {
        /// Task id
        id: u64,

        #[arg(long, short = 't')]
        title: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,

        #[arg(long, short = 's')]
        status: Option<String>,
    },

    /// Move a task to another column
    Move {
        /// Task id
        id: u64,

        /// Target column: todo, doing or done
        status: String,
    },

    /// Delete a task
    #[command(alias = "delete")]
    Rm {
        /// Task id
        id: u64,
    },

    /// Discard the stored board and reseed the defaults
    Reset,
}

impl Cli {
    /// True when this run takes over the terminal with the board
    pub fn opens_board(&self) -> bool {
        matches!(self.command, None | Some(Commands::Board))
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let context = task::ContextOptions {
            store: self.store,
            config: self.config,
        };
        let output = crate::output::OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        match self.command.unwrap_or(Commands::Board) {
            Commands::Board => board::run(context, output),
            Commands::List { status } => task::run_list(context, output, status),
            Commands::Add {
                title,
                description,
                status,
            } => task::run_add(
                context,
                output,
                task::AddOptions {
                    title,
                    description,
                    status,
                },
            ),
            Commands::Edit {
                id,
                title,
                description,
                status,
            } => task::run_edit(
                context,
                output,
                task::EditOptions {
                    id,
                    title,
                    description,
                    status,
                },
            ),
            Commands::Move { id, status } => task::run_move(context, output, id, &status),
            Commands::Rm { id } => task::run_rm(context, output, id),
            Commands::Reset => task::run_reset(context, output),
        }
    }
}
