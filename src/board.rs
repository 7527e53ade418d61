//! Board projection: the three status columns the user sees.
//!
//! `Board` never touches the task collection. It is handed a slice after
//! each store mutation and rebuilds every column from scratch, so the
//! result depends only on the slice it was given last.

use serde::Serialize;

use crate::config::BoardConfig;
use crate::task::{RenderSink, Task, TaskStatus};

/// One task as shown inside a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: u64,
    pub title: String,
    pub description: String,
}

impl Card {
    fn from_task(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
        }
    }
}

/// Request raised by a card to open the editor on its task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditRequest {
    pub task_id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub status: TaskStatus,
    header: String,
    cards: Vec<Card>,
}

impl Column {
    fn new(status: TaskStatus, label: &str) -> Self {
        Self {
            status,
            header: label.to_string(),
            cards: Vec::new(),
        }
    }

    /// Header text, `"<LABEL> (<count>)"` once rendered
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Header text without the count annotation
    pub fn label(&self) -> &str {
        strip_count_annotation(&self.header)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn count(&self) -> usize {
        self.cards.len()
    }
}

/// Drop a trailing `" (<digits>)"` from a header, if present
pub fn strip_count_annotation(header: &str) -> &str {
    let Some(inner) = header.strip_suffix(')') else {
        return header;
    };
    let Some(open) = inner.rfind(" (") else {
        return header;
    };
    let digits = &inner[open + 2..];
    if !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()) {
        &header[..open]
    } else {
        header
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    columns: [Column; 3],
}

impl Default for Board {
    fn default() -> Self {
        Self::from_config(&BoardConfig::default())
    }
}

impl Board {
    pub fn new(todo_label: &str, doing_label: &str, done_label: &str) -> Self {
        Self {
            columns: [
                Column::new(TaskStatus::Todo, todo_label),
                Column::new(TaskStatus::Doing, doing_label),
                Column::new(TaskStatus::Done, done_label),
            ],
        }
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(&config.todo_label, &config.doing_label, &config.done_label)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, status: TaskStatus) -> &Column {
        &self.columns[status.index()]
    }

    pub fn count(&self, status: TaskStatus) -> usize {
        self.column(status).count()
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(Column::count).sum()
    }

    /// Forward an edit request for the card at `row` of a column
    pub fn edit_request(&self, status: TaskStatus, row: usize) -> Option<EditRequest> {
        self.column(status)
            .cards
            .get(row)
            .map(|card| EditRequest { task_id: card.id })
    }

    /// Locate a task's column and row
    pub fn position_of(&self, task_id: u64) -> Option<(TaskStatus, usize)> {
        self.columns.iter().find_map(|column| {
            column
                .cards
                .iter()
                .position(|card| card.id == task_id)
                .map(|row| (column.status, row))
        })
    }
}

impl RenderSink for Board {
    fn render(&mut self, tasks: &[Task]) {
        for column in &mut self.columns {
            column.cards.clear();
            column.cards.extend(
                tasks
                    .iter()
                    .filter(|task| task.status == column.status)
                    .map(Card::from_task),
            );
        }
        for column in &mut self.columns {
            let label = strip_count_annotation(&column.header).to_string();
            column.header = format!("{label} ({})", column.cards.len());
        }
    }
}
