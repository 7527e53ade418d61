//! Command reporting.
//!
//! Every CLI command ends in exactly one of two shapes: a short human
//! [`Report`] on stdout, or a single JSON envelope when `--json` is
//! set. Errors go through the same envelope in JSON mode and to stderr
//! otherwise.

use std::fmt;

use serde::Serialize;

use crate::error::{exit_codes, Error, Result};

pub const SCHEMA_VERSION: &str = "taskboard.v1";

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Human-facing summary of what a command did
#[derive(Debug, Clone, Default)]
pub struct Report {
    title: String,
    fields: Vec<(String, String)>,
    items: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// A `key: value` line in the summary block
    pub fn field(&mut self, key: impl Into<String>, value: impl ToString) {
        self.fields.push((key.into(), value.to_string()));
    }

    /// A free-form line in the details block
    pub fn item(&mut self, line: impl Into<String>) {
        self.items.push(line.into());
    }

    /// Something the user should know even though the command succeeded
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn suggest(&mut self, command: impl Into<String>) {
        self.next_steps.push(command.into());
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)?;
        if !self.fields.is_empty() {
            f.write_str("\n\nSummary:")?;
            for (key, value) in &self.fields {
                if value.is_empty() {
                    write!(f, "\n- {key}")?;
                } else {
                    write!(f, "\n- {key}: {value}")?;
                }
            }
        }
        write_block(f, "Details", &self.items)?;
        write_block(f, "Warnings", &self.warnings)?;
        write_block(f, "Next steps", &self.next_steps)
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, heading: &str, lines: &[String]) -> fmt::Result {
    if lines.is_empty() {
        return Ok(());
    }
    write!(f, "\n\n{heading}:")?;
    lines.iter().try_for_each(|line| write!(f, "\n- {line}"))
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            message: err.to_string(),
            code: err.exit_code(),
            kind: error_kind(err),
            details: err.details(),
        }
    }
}

/// The one JSON document a command prints in `--json` mode
#[derive(Debug, Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "no_lines")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "no_lines")]
    next_steps: &'a [String],
}

fn no_lines(lines: &&[String]) -> bool {
    lines.is_empty()
}

impl<T: Serialize> Envelope<'_, T> {
    fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

/// Print the result of a command that succeeded
///
/// Quiet mode drops the report but still surfaces warnings on stderr.
pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    report: &Report,
) -> Result<()> {
    if options.json {
        return Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Outcome::Success,
            data: Some(data),
            error: None,
            warnings: &report.warnings,
            next_steps: &report.next_steps,
        }
        .print();
    }

    if options.quiet {
        for warning in &report.warnings {
            eprintln!("warning: {warning}");
        }
    } else {
        println!("{report}");
    }
    Ok(())
}

/// Print a failed command's error, with a recovery hint when one exists
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = recovery_steps(err);
    if json {
        return Envelope::<()> {
            schema_version: SCHEMA_VERSION,
            command,
            status: Outcome::Error,
            data: None,
            error: Some(ErrorBody::from(err)),
            warnings: &[],
            next_steps: &next_steps,
        }
        .print();
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

const COMMANDS: [&str; 7] = ["board", "list", "add", "edit", "move", "rm", "reset"];

/// Name of the subcommand in `args`, for envelopes printed before clap
/// has parsed anything. Falls back to `board`, the default command.
pub fn command_name<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .find_map(|arg| {
            let arg = arg.as_ref();
            match arg {
                "delete" => Some("rm"),
                _ => COMMANDS.iter().copied().find(|name| *name == arg),
            }
        })
        .unwrap_or("board")
        .to_string()
}

fn error_kind(err: &Error) -> &'static str {
    if err.exit_code() == exit_codes::USER_ERROR {
        "user_error"
    } else {
        "operation_failed"
    }
}

fn recovery_steps(err: &Error) -> Vec<String> {
    let step = match err {
        Error::TaskNotFound(_) => "taskboard list",
        Error::InvalidStatus(_) => "use one of: todo, doing, done",
        Error::EmptyTitle => "taskboard add \"<title>\"",
        Error::InvalidConfig(_) => "fix taskboard.toml then retry",
        Error::LockFailed(_) => "another taskboard process holds the store; retry",
        _ => return Vec::new(),
    };
    vec![step.to_string()]
}
