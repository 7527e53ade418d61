//! `taskboard board`: the interactive view.

use crate::error::{Error, Result};
use crate::output::OutputOptions;

use super::task::{load_context, ContextOptions};

pub fn run(context: ContextOptions, output: OutputOptions) -> Result<()> {
    if output.json {
        return Err(Error::InvalidArgument(
            "the interactive board does not support --json".to_string(),
        ));
    }
    if output.quiet {
        return Err(Error::InvalidArgument(
            "the interactive board does not support --quiet".to_string(),
        ));
    }
    let ctx = load_context(context)?;
    crate::ui::board_viewer::run(ctx.store)
}
