//! Task model and the task store.
//!
//! The [`TaskStore`] owns the board's task collection. Every mutation runs
//! the same three steps in order: change the collection, persist the whole
//! collection through the [`PersistenceGateway`], then hand the collection
//! to the store's [`RenderSink`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::PersistenceGateway;

/// Column a task sits in
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    Doing,
    Done,
}

impl TaskStatus {
    /// All statuses in board order
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::Doing, TaskStatus::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Doing => "doing",
            TaskStatus::Done => "done",
        }
    }

    /// Position in board order
    pub fn index(self) -> usize {
        match self {
            TaskStatus::Todo => 0,
            TaskStatus::Doing => 1,
            TaskStatus::Done => 2,
        }
    }

    /// Next status in board order, wrapping
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous status in board order, wrapping
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "doing" => Ok(TaskStatus::Doing),
            "done" => Ok(TaskStatus::Done),
            _ => Err(Error::InvalidStatus(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
}

impl Task {
    pub fn new(
        id: u64,
        title: impl Into<String>,
        description: impl Into<String>,
        status: TaskStatus,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            status,
        }
    }
}

/// Result of [`TaskStore::update`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(Task),
    NotFound,
}

/// Result of [`TaskStore::delete`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Task),
    NotFound,
}

/// Receiver of the collection after every store mutation
pub trait RenderSink {
    fn render(&mut self, tasks: &[Task]);
}

/// Board used when nothing has been stored yet
pub fn default_tasks() -> Vec<Task> {
    vec![
        Task::new(
            1,
            "Plan the week",
            "List the priorities and block out focus time.",
            TaskStatus::Todo,
        ),
        Task::new(2, "Review open pull requests", "", TaskStatus::Todo),
        Task::new(
            3,
            "Write the project brief",
            "Goals, scope and the first milestones.",
            TaskStatus::Doing,
        ),
        Task::new(
            4,
            "Set up the repository",
            "Create the repo and the initial CI workflow.",
            TaskStatus::Done,
        ),
    ]
}

/// Next id for a collection: one past the largest, or 1 when empty
///
/// `None` once the largest id is `u64::MAX`; no larger id exists.
pub fn next_task_id(tasks: &[Task]) -> Option<u64> {
    match tasks.iter().map(|task| task.id).max() {
        Some(max) => max.checked_add(1),
        None => Some(1),
    }
}

fn normalize_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Sole owner and mutator of the task collection
pub struct TaskStore<R: RenderSink> {
    tasks: Vec<Task>,
    gateway: PersistenceGateway,
    renderer: R,
    seed_defaults: bool,
}

impl<R: RenderSink> TaskStore<R> {
    /// Create an empty store; call [`TaskStore::initialize`] before use
    pub fn new(gateway: PersistenceGateway, renderer: R) -> Self {
        Self {
            tasks: Vec::new(),
            gateway,
            renderer,
            seed_defaults: true,
        }
    }

    /// Whether an empty or missing board is seeded with sample tasks
    pub fn with_seed_defaults(mut self, seed: bool) -> Self {
        self.seed_defaults = seed;
        self
    }

    /// Create and initialize in one step
    pub fn open(gateway: PersistenceGateway, renderer: R) -> Self {
        let mut store = Self::new(gateway, renderer);
        store.initialize();
        store
    }

    /// Adopt the stored collection, or seed and persist the defaults
    pub fn initialize(&mut self) {
        match self.gateway.load() {
            Some(tasks) if !tasks.is_empty() => {
                tracing::debug!(count = tasks.len(), "adopted stored tasks");
                self.tasks = tasks;
            }
            _ => {
                self.tasks = if self.seed_defaults {
                    default_tasks()
                } else {
                    Vec::new()
                };
                tracing::info!(count = self.tasks.len(), "seeded board");
                self.gateway.save(&self.tasks);
            }
        }
        self.renderer.render(&self.tasks);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    pub fn create(&mut self, title: &str, description: &str, status: TaskStatus) -> Result<Task> {
        let title = normalize_title(title)?;
        let id = next_task_id(&self.tasks)
            .ok_or_else(|| Error::OperationFailed("task id space exhausted".to_string()))?;
        let task = Task::new(id, title, description, status);
        self.tasks.push(task.clone());
        tracing::debug!(id = task.id, status = %task.status, "task created");
        self.commit();
        Ok(task)
    }

    /// Replace title, description and status of task `id` in place
    ///
    /// An unknown id leaves the collection as is but still persists and
    /// re-renders.
    pub fn update(
        &mut self,
        id: u64,
        title: &str,
        description: &str,
        status: TaskStatus,
    ) -> Result<UpdateOutcome> {
        let title = normalize_title(title)?;
        let outcome = match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.title = title;
                task.description = description.to_string();
                task.status = status;
                tracing::debug!(id, status = %status, "task updated");
                UpdateOutcome::Updated(task.clone())
            }
            None => {
                tracing::debug!(id, "update target not found");
                UpdateOutcome::NotFound
            }
        };
        self.commit();
        Ok(outcome)
    }

    pub fn delete(&mut self, id: u64) -> DeleteOutcome {
        let outcome = match self.tasks.iter().position(|task| task.id == id) {
            Some(pos) => {
                let removed = self.tasks.remove(pos);
                tracing::debug!(id, "task deleted");
                DeleteOutcome::Deleted(removed)
            }
            None => {
                tracing::debug!(id, "delete target not found");
                DeleteOutcome::NotFound
            }
        };
        self.commit();
        outcome
    }

    /// Drop the stored board and start over from the seed
    pub fn reset(&mut self) {
        self.gateway.clear();
        self.initialize();
    }

    fn commit(&mut self) {
        self.gateway.save(&self.tasks);
        self.renderer.render(&self.tasks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore, DEFAULT_TASKS_KEY};

    #[derive(Default)]
    struct CountingSink {
        renders: usize,
        last: Vec<Task>,
    }

    impl RenderSink for CountingSink {
        fn render(&mut self, tasks: &[Task]) {
            self.renders += 1;
            self.last = tasks.to_vec();
        }
    }

    fn store_with(tasks: &[Task]) -> TaskStore<CountingSink> {
        let raw = serde_json::to_string(tasks).unwrap();
        let kv = MemoryStore::new().with_entry(DEFAULT_TASKS_KEY, &raw);
        TaskStore::open(PersistenceGateway::new(Box::new(kv)), CountingSink::default())
    }

    fn stored(store: &TaskStore<CountingSink>) -> Vec<Task> {
        let raw = store
            .gateway()
            .store()
            .get(DEFAULT_TASKS_KEY)
            .unwrap()
            .unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(" Doing ".parse::<TaskStatus>().unwrap(), TaskStatus::Doing);
        assert!(matches!(
            "blocked".parse::<TaskStatus>(),
            Err(Error::InvalidStatus(_))
        ));
    }

    #[test]
    fn status_cycles_in_board_order() {
        assert_eq!(TaskStatus::Todo.next(), TaskStatus::Doing);
        assert_eq!(TaskStatus::Done.next(), TaskStatus::Todo);
        assert_eq!(TaskStatus::Todo.prev(), TaskStatus::Done);
    }

    #[test]
    fn next_id_is_one_past_max() {
        assert_eq!(next_task_id(&[]), Some(1));
        let tasks = vec![
            Task::new(7, "a", "", TaskStatus::Todo),
            Task::new(3, "b", "", TaskStatus::Todo),
        ];
        assert_eq!(next_task_id(&tasks), Some(8));
        assert_eq!(
            next_task_id(&[Task::new(u64::MAX, "top", "", TaskStatus::Todo)]),
            None
        );
    }

    #[test]
    fn create_fails_cleanly_when_ids_are_exhausted() {
        let tasks = vec![Task::new(u64::MAX, "Top", "", TaskStatus::Todo)];
        let mut store = store_with(&tasks);

        for _ in 0..2 {
            let result = store.create("y", "", TaskStatus::Todo);
            assert!(matches!(result, Err(Error::OperationFailed(_))));
        }
        assert_eq!(store.tasks(), tasks.as_slice());
        assert_eq!(stored(&store), tasks);
        assert_eq!(store.renderer().renders, 1);
    }

    #[test]
    fn initialize_seeds_and_persists_when_empty() {
        let store = TaskStore::open(
            PersistenceGateway::new(Box::new(MemoryStore::new())),
            CountingSink::default(),
        );
        assert_eq!(store.tasks(), default_tasks().as_slice());
        assert_eq!(stored(&store), default_tasks());
        assert_eq!(store.renderer().renders, 1);
    }

    #[test]
    fn initialize_seeds_when_stored_array_is_empty() {
        let store = store_with(&[]);
        assert_eq!(store.tasks().len(), default_tasks().len());
    }

    #[test]
    fn initialize_without_seed_starts_empty() {
        let mut store = TaskStore::new(
            PersistenceGateway::new(Box::new(MemoryStore::new())),
            CountingSink::default(),
        )
        .with_seed_defaults(false);
        store.initialize();
        assert!(store.tasks().is_empty());
        assert!(stored(&store).is_empty());
    }

    #[test]
    fn initialize_adopts_stored_tasks_verbatim() {
        let tasks = vec![
            Task::new(5, "Stored", "kept", TaskStatus::Doing),
            Task::new(2, "Older", "", TaskStatus::Todo),
        ];
        let store = store_with(&tasks);
        assert_eq!(store.tasks(), tasks.as_slice());
    }

    #[test]
    fn create_assigns_next_id_persists_and_renders() {
        let mut store = store_with(&[Task::new(1, "Existing", "", TaskStatus::Todo)]);
        let created = store.create("Buy milk", "", TaskStatus::Todo).unwrap();

        assert_eq!(created.id, 2);
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(stored(&store), store.tasks());
        assert_eq!(store.renderer().renders, 2);
        assert_eq!(store.renderer().last, store.tasks());
    }

    #[test]
    fn create_ids_stay_unique_and_increasing() {
        let mut store = store_with(&[
            Task::new(4, "a", "", TaskStatus::Todo),
            Task::new(9, "b", "", TaskStatus::Done),
        ]);
        let mut last = 9;
        for n in 0..5 {
            let task = store
                .create(&format!("task {n}"), "", TaskStatus::Doing)
                .unwrap();
            assert!(task.id > last);
            last = task.id;
        }
        let mut ids: Vec<u64> = store.tasks().iter().map(|task| task.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), store.tasks().len());
    }

    #[test]
    fn create_rejects_blank_title_without_side_effects() {
        let mut store = store_with(&[Task::new(1, "Existing", "", TaskStatus::Todo)]);
        let result = store.create("   ", "body", TaskStatus::Todo);

        assert!(matches!(result, Err(Error::EmptyTitle)));
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.renderer().renders, 1);
    }

    #[test]
    fn create_trims_title() {
        let mut store = store_with(&[]);
        let created = store.create("  Padded  ", "", TaskStatus::Todo).unwrap();
        assert_eq!(created.title, "Padded");
    }

    #[test]
    fn update_replaces_fields_and_leaves_others() {
        let mut store = store_with(&[
            Task::new(1, "Old", "", TaskStatus::Todo),
            Task::new(2, "Other", "same", TaskStatus::Doing),
        ]);
        let outcome = store
            .update(1, "New title", "desc", TaskStatus::Done)
            .unwrap();

        let expected = Task::new(1, "New title", "desc", TaskStatus::Done);
        assert_eq!(outcome, UpdateOutcome::Updated(expected.clone()));
        assert_eq!(store.get(1), Some(&expected));
        assert_eq!(
            store.get(2),
            Some(&Task::new(2, "Other", "same", TaskStatus::Doing))
        );
        assert_eq!(store.tasks()[0].id, 1);
        assert_eq!(stored(&store), store.tasks());
    }

    #[test]
    fn update_unknown_id_still_persists_and_renders() {
        let tasks = vec![Task::new(1, "Only", "", TaskStatus::Todo)];
        let mut store = store_with(&tasks);
        let outcome = store.update(42, "x", "", TaskStatus::Done).unwrap();

        assert_eq!(outcome, UpdateOutcome::NotFound);
        assert_eq!(store.tasks(), tasks.as_slice());
        assert_eq!(store.renderer().renders, 2);
    }

    #[test]
    fn delete_removes_exactly_one_and_is_idempotent() {
        let mut store = store_with(&[
            Task::new(1, "a", "", TaskStatus::Todo),
            Task::new(2, "b", "", TaskStatus::Doing),
            Task::new(3, "c", "", TaskStatus::Done),
        ]);

        assert!(matches!(store.delete(2), DeleteOutcome::Deleted(task) if task.id == 2));
        assert_eq!(store.tasks().len(), 2);
        assert!(store.get(2).is_none());

        assert_eq!(store.delete(2), DeleteOutcome::NotFound);
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(stored(&store), store.tasks());
        assert_eq!(store.renderer().renders, 3);
    }

    #[test]
    fn ids_are_not_reused_after_deleting_the_max() {
        let mut store = store_with(&[
            Task::new(1, "a", "", TaskStatus::Todo),
            Task::new(2, "b", "", TaskStatus::Todo),
        ]);
        store.delete(1);
        let created = store.create("c", "", TaskStatus::Todo).unwrap();
        assert_eq!(created.id, 3);
    }

    #[test]
    fn state_stays_authoritative_when_saves_fail() {
        let mut store = TaskStore::open(
            PersistenceGateway::new(Box::new(MemoryStore::with_quota(16))),
            CountingSink::default(),
        );
        let created = store.create("Still here", "", TaskStatus::Todo).unwrap();
        assert!(store.get(created.id).is_some());
        assert_eq!(store.renderer().last, store.tasks());
    }

    #[test]
    fn reset_reseeds_defaults() {
        let mut store = store_with(&[Task::new(10, "Custom", "", TaskStatus::Done)]);
        store.reset();
        assert_eq!(store.tasks(), default_tasks().as_slice());
        assert_eq!(stored(&store), default_tasks());
    }
}
