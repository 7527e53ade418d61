//! taskboard - Kanban board CLI
//!
//! Opens the interactive board by default; subcommands expose the same
//! task operations for scripts.

use clap::Parser;
use taskboard::cli::Cli;
use taskboard::logging;
use taskboard::output::{command_name, emit_error};

fn main() {
    let command = command_name(std::env::args().skip(1));
    let cli = Cli::parse();
    logging::init(cli.opens_board());

    let json = cli.json;
    if let Err(err) = cli.run() {
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}
