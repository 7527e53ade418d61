//! Non-interactive task commands.

use std::path::PathBuf;

use serde::Serialize;

use crate::board::Board;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_success, OutputOptions, Report};
use crate::storage::{resolve_store_path, FileStore, PersistenceGateway};
use crate::task::{DeleteOutcome, Task, TaskStatus, TaskStore, UpdateOutcome};

/// Where the board lives, as given on the command line
pub struct ContextOptions {
    pub store: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub struct AddOptions {
    pub title: String,
    pub description: String,
    pub status: String,
}

pub struct EditOptions {
    pub id: u64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

pub(crate) struct BoardContext {
    pub(crate) store: TaskStore<Board>,
    pub(crate) store_path: PathBuf,
}

impl BoardContext {
    /// Warn when the last write to the store did not go through
    fn note_unsaved(&self, report: &mut Report) {
        if let Some(err) = self.store.gateway().last_save_error() {
            report.warn(format!("changes were not saved: {err}"));
        }
    }
}

pub fn run_list(
    context: ContextOptions,
    output: OutputOptions,
    status: Option<String>,
) -> Result<()> {
    let filter = status.as_deref().map(str::parse::<TaskStatus>).transpose()?;
    let ctx = load_context(context)?;

    let columns: Vec<ColumnOutput> = ctx
        .store
        .renderer()
        .columns()
        .iter()
        .filter(|column| filter.map_or(true, |status| column.status == status))
        .map(|column| ColumnOutput {
            status: column.status,
            label: column.label().to_string(),
            count: column.count(),
            tasks: ctx
                .store
                .tasks()
                .iter()
                .filter(|task| task.status == column.status)
                .cloned()
                .collect(),
        })
        .collect();
    let data = ListOutput {
        total: columns.iter().map(|column| column.count).sum(),
        columns,
    };

    let mut report = Report::new("Board");
    for column in ctx.store.renderer().columns() {
        if filter.map_or(true, |status| column.status == status) {
            report.field(column.label(), column.count());
        }
    }
    for column in &data.columns {
        for task in &column.tasks {
            report.item(task_line(task));
        }
    }
    if data.total == 0 {
        report.suggest("taskboard add \"<title>\"");
    }

    ctx.note_unsaved(&mut report);
    emit_success(output, "list", &data, &report)
}

pub fn run_add(context: ContextOptions, output: OutputOptions, options: AddOptions) -> Result<()> {
    let status: TaskStatus = options.status.parse()?;
    let mut ctx = load_context(context)?;
    let task = ctx
        .store
        .create(&options.title, &options.description, status)?;

    let mut report = Report::new("Task created");
    summarize_task(&mut report, &task);
    report.field(
        "Column",
        ctx.store.renderer().column(task.status).header().to_string(),
    );

    ctx.note_unsaved(&mut report);
    emit_success(output, "add", &task, &report)
}

pub fn run_edit(context: ContextOptions, output: OutputOptions, options: EditOptions) -> Result<()> {
    let status = options
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;
    let mut ctx = load_context(context)?;
    let current = ctx
        .store
        .get(options.id)
        .cloned()
        .ok_or(Error::TaskNotFound(options.id))?;

    let title = options.title.unwrap_or(current.title);
    let description = options.description.unwrap_or(current.description);
    let status = status.unwrap_or(current.status);
    let task = updated_or_missing(
        options.id,
        ctx.store.update(options.id, &title, &description, status)?,
    )?;

    let mut report = Report::new("Task updated");
    summarize_task(&mut report, &task);

    ctx.note_unsaved(&mut report);
    emit_success(output, "edit", &task, &report)
}

pub fn run_move(context: ContextOptions, output: OutputOptions, id: u64, status: &str) -> Result<()> {
    let status: TaskStatus = status.parse()?;
    let mut ctx = load_context(context)?;
    let current = ctx
        .store
        .get(id)
        .cloned()
        .ok_or(Error::TaskNotFound(id))?;
    let from = current.status;

    let task = updated_or_missing(
        id,
        ctx.store
            .update(id, &current.title, &current.description, status)?,
    )?;

    let mut report = Report::new("Task moved");
    report.field("ID", task.id);
    report.field("From", from);
    report.field("To", task.status);

    ctx.note_unsaved(&mut report);
    emit_success(output, "move", &task, &report)
}

pub fn run_rm(context: ContextOptions, output: OutputOptions, id: u64) -> Result<()> {
    let mut ctx = load_context(context)?;
    let task = match ctx.store.delete(id) {
        DeleteOutcome::Deleted(task) => task,
        DeleteOutcome::NotFound => return Err(Error::TaskNotFound(id)),
    };

    let mut report = Report::new("Task deleted");
    report.field("ID", task.id);
    report.field("Title", &task.title);
    report.field("Remaining", ctx.store.tasks().len());

    ctx.note_unsaved(&mut report);
    emit_success(output, "rm", &DeleteOutput { id: task.id }, &report)
}

pub fn run_reset(context: ContextOptions, output: OutputOptions) -> Result<()> {
    let mut ctx = load_context(context)?;
    ctx.store.reset();

    let data = ResetOutput {
        store: ctx.store_path.display().to_string(),
        total: ctx.store.tasks().len(),
        tasks: ctx.store.tasks().to_vec(),
    };
    let mut report = Report::new("Board reset");
    report.field("Store", &data.store);
    report.field("Tasks", data.total);

    ctx.note_unsaved(&mut report);
    emit_success(output, "reset", &data, &report)
}

/// Resolve config and store, then open the board on it
pub(crate) fn load_context(options: ContextOptions) -> Result<BoardContext> {
    let config = Config::resolve(options.config.as_deref())?;
    let store_path = resolve_store_path(options.store.as_deref(), config.storage.path.as_deref())?;
    tracing::debug!(store = %store_path.display(), key = %config.storage.key, "opening board");

    let gateway = PersistenceGateway::with_key(
        Box::new(
            FileStore::new(store_path.clone()).with_lock_timeout(config.storage.lock_timeout_ms),
        ),
        config.storage.key.clone(),
    );
    let mut store = TaskStore::new(gateway, Board::from_config(&config.board))
        .with_seed_defaults(config.seed.enabled);
    store.initialize();

    Ok(BoardContext { store, store_path })
}

fn updated_or_missing(id: u64, outcome: UpdateOutcome) -> Result<Task> {
    match outcome {
        UpdateOutcome::Updated(task) => Ok(task),
        UpdateOutcome::NotFound => Err(Error::TaskNotFound(id)),
    }
}

fn summarize_task(report: &mut Report, task: &Task) {
    report.field("ID", task.id);
    report.field("Title", &task.title);
    report.field("Status", task.status);
    if !task.description.is_empty() {
        report.field("Description", &task.description);
    }
}

fn task_line(task: &Task) -> String {
    if task.description.is_empty() {
        format!("[{}] #{} {}", task.status, task.id, task.title)
    } else {
        format!(
            "[{}] #{} {} - {}",
            task.status, task.id, task.title, task.description
        )
    }
}

#[derive(Serialize)]
struct ColumnOutput {
    status: TaskStatus,
    label: String,
    count: usize,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct ListOutput {
    total: usize,
    columns: Vec<ColumnOutput>,
}

#[derive(Serialize)]
struct DeleteOutput {
    id: u64,
}

#[derive(Serialize)]
struct ResetOutput {
    store: String,
    total: usize,
    tasks: Vec<Task>,
}
