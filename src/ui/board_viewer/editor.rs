use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::task::{DeleteOutcome, RenderSink, Task, TaskStatus, TaskStore, UpdateOutcome};

pub const TITLE_REQUIRED: &str = "title is required";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    NewTask,
    EditTask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorFieldId {
    Title,
    Description,
    Status,
}

const FIELD_ORDER: [EditorFieldId; 3] = [
    EditorFieldId::Title,
    EditorFieldId::Description,
    EditorFieldId::Status,
];

impl EditorFieldId {
    pub fn label(self) -> &'static str {
        match self {
            EditorFieldId::Title => "Title",
            EditorFieldId::Description => "Description",
            EditorFieldId::Status => "Status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSubmit {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Cancel,
    Submit,
    ConfirmDelete,
}

/// Field values and focus of an open editor
#[derive(Debug, Clone)]
pub struct EditorState {
    kind: EditorKind,
    task_id: Option<u64>,
    title: String,
    description: String,
    status: TaskStatus,
    active: usize,
    title_error: Option<&'static str>,
    confirming_delete: bool,
}

impl EditorState {
    pub fn new_task() -> Self {
        Self {
            kind: EditorKind::NewTask,
            task_id: None,
            title: String::new(),
            description: String::new(),
            status: TaskStatus::Todo,
            active: 0,
            title_error: None,
            confirming_delete: false,
        }
    }

    pub fn edit_task(task: &Task) -> Self {
        Self {
            kind: EditorKind::EditTask,
            task_id: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            active: 0,
            title_error: None,
            confirming_delete: false,
        }
    }

    pub fn kind(&self) -> EditorKind {
        self.kind
    }

    pub fn task_id(&self) -> Option<u64> {
        self.task_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn fields(&self) -> &'static [EditorFieldId] {
        &FIELD_ORDER
    }

    pub fn active_field(&self) -> EditorFieldId {
        FIELD_ORDER[self.active]
    }

    /// Validation indicator for the title field
    pub fn title_error(&self) -> Option<&'static str> {
        self.title_error
    }

    pub fn confirming_delete(&self) -> bool {
        self.confirming_delete
    }

    pub fn can_delete(&self) -> bool {
        self.kind == EditorKind::EditTask
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.title = value.into();
        self.revalidate();
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.description = value.into();
    }

    pub fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    /// Move focus to `field`, re-checking the title on blur and focus
    pub fn focus(&mut self, field: EditorFieldId) {
        let next = FIELD_ORDER
            .iter()
            .position(|candidate| *candidate == field)
            .unwrap_or(0);
        self.move_focus_to(next);
    }

    /// Show the delete confirmation; only edit mode offers delete
    pub fn request_delete(&mut self) -> bool {
        if !self.can_delete() {
            return false;
        }
        self.confirming_delete = true;
        true
    }

    pub fn decline_delete(&mut self) {
        self.confirming_delete = false;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        if self.confirming_delete {
            return self.handle_confirm_key(key);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('d') => {
                    self.request_delete();
                }
                KeyCode::Char('u') => {
                    match self.active_field() {
                        EditorFieldId::Title => self.set_title(String::new()),
                        EditorFieldId::Description => self.description.clear(),
                        EditorFieldId::Status => {}
                    }
                }
                KeyCode::Char('s') => return EditorAction::Submit,
                _ => {}
            }
            return EditorAction::None;
        }

        match key.code {
            KeyCode::Esc => return EditorAction::Cancel,
            KeyCode::Enter => return EditorAction::Submit,
            KeyCode::Tab | KeyCode::Down => self.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(-1),
            KeyCode::Left if self.active_field() == EditorFieldId::Status => {
                self.status = self.status.prev();
            }
            KeyCode::Right if self.active_field() == EditorFieldId::Status => {
                self.status = self.status.next();
            }
            KeyCode::Backspace => match self.active_field() {
                EditorFieldId::Title => {
                    self.title.pop();
                    self.revalidate();
                }
                EditorFieldId::Description => {
                    self.description.pop();
                }
                EditorFieldId::Status => {}
            },
            KeyCode::Char(ch) if !ch.is_control() => match self.active_field() {
                EditorFieldId::Title => {
                    self.title.push(ch);
                    self.revalidate();
                }
                EditorFieldId::Description => self.description.push(ch),
                EditorFieldId::Status => {
                    if ch == ' ' {
                        self.status = self.status.next();
                    }
                }
            },
            _ => {}
        }

        EditorAction::None
    }

    /// Validate and collect the field values for the store
    ///
    /// A failing check raises the title indicator.
    pub fn build_submit(&mut self) -> Result<EditorSubmit, &'static str> {
        self.revalidate();
        if let Some(err) = self.title_error {
            return Err(err);
        }
        Ok(EditorSubmit {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            status: self.status,
        })
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> EditorAction {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => EditorAction::ConfirmDelete,
            KeyCode::Char('n') | KeyCode::Esc | KeyCode::Backspace => {
                self.decline_delete();
                EditorAction::None
            }
            _ => EditorAction::None,
        }
    }

    fn revalidate(&mut self) {
        self.title_error = validate_title(&self.title).err();
    }

    fn move_focus(&mut self, delta: isize) {
        let len = FIELD_ORDER.len() as isize;
        let next = (self.active as isize + delta).rem_euclid(len) as usize;
        self.move_focus_to(next);
    }

    fn move_focus_to(&mut self, next: usize) {
        let leaving_title = self.active_field() == EditorFieldId::Title;
        self.active = next;
        let entering_title = self.active_field() == EditorFieldId::Title;
        if leaving_title || entering_title {
            self.revalidate();
        }
    }
}

fn validate_title(title: &str) -> Result<(), &'static str> {
    if title.trim().is_empty() {
        return Err(TITLE_REQUIRED);
    }
    Ok(())
}

/// What a session step did to the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    None,
    Cancelled,
    Invalid,
    Created(Task),
    Updated(Task),
    Deleted(u64),
    Missing(u64),
    Failed(String),
}

impl SessionOutcome {
    /// Status line text for the outcome, if any
    pub fn message(&self) -> Option<String> {
        match self {
            SessionOutcome::None | SessionOutcome::Invalid => None,
            SessionOutcome::Cancelled => Some("cancelled".to_string()),
            SessionOutcome::Created(task) => Some(format!("created #{}", task.id)),
            SessionOutcome::Updated(task) => Some(format!("updated #{}", task.id)),
            SessionOutcome::Deleted(id) => Some(format!("deleted #{id}")),
            SessionOutcome::Missing(id) => Some(format!("task #{id} no longer exists")),
            SessionOutcome::Failed(err) => Some(err.clone()),
        }
    }
}

/// The create/edit interaction: closed, or open on one editor
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    state: Option<EditorState>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&EditorState> {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> Option<&mut EditorState> {
        self.state.as_mut()
    }

    pub fn open_create(&mut self) {
        self.state = Some(EditorState::new_task());
    }

    pub fn open_edit(&mut self, task: &Task) {
        self.state = Some(EditorState::edit_task(task));
    }

    pub fn cancel(&mut self) -> SessionOutcome {
        if self.state.take().is_some() {
            SessionOutcome::Cancelled
        } else {
            SessionOutcome::None
        }
    }

    /// Validate, then create or update through the store
    ///
    /// The session stays open when validation fails.
    pub fn commit<R: RenderSink>(&mut self, store: &mut TaskStore<R>) -> SessionOutcome {
        let Some(state) = self.state.as_mut() else {
            return SessionOutcome::None;
        };
        let submit = match state.build_submit() {
            Ok(submit) => submit,
            Err(_) => return SessionOutcome::Invalid,
        };

        let outcome = match (state.kind(), state.task_id()) {
            (EditorKind::NewTask, _) => store
                .create(&submit.title, &submit.description, submit.status)
                .map(SessionOutcome::Created),
            (EditorKind::EditTask, Some(id)) => store
                .update(id, &submit.title, &submit.description, submit.status)
                .map(|outcome| match outcome {
                    UpdateOutcome::Updated(task) => SessionOutcome::Updated(task),
                    UpdateOutcome::NotFound => SessionOutcome::Missing(id),
                }),
            (EditorKind::EditTask, None) => {
                return SessionOutcome::Failed("missing task id for edit".to_string());
            }
        };

        match outcome {
            Ok(outcome) => {
                self.state = None;
                outcome
            }
            Err(err) => SessionOutcome::Failed(err.to_string()),
        }
    }

    /// Delete the edited task; requires a pending confirmation
    pub fn confirm_delete<R: RenderSink>(&mut self, store: &mut TaskStore<R>) -> SessionOutcome {
        let Some(state) = self.state.as_ref() else {
            return SessionOutcome::None;
        };
        if !state.confirming_delete() {
            return SessionOutcome::None;
        }
        let Some(id) = state.task_id() else {
            return SessionOutcome::None;
        };
        self.state = None;
        match store.delete(id) {
            DeleteOutcome::Deleted(task) => SessionOutcome::Deleted(task.id),
            DeleteOutcome::NotFound => SessionOutcome::Missing(id),
        }
    }

    /// Route a key to the open editor and act on what it asks for
    pub fn handle_key<R: RenderSink>(
        &mut self,
        key: KeyEvent,
        store: &mut TaskStore<R>,
    ) -> SessionOutcome {
        let Some(state) = self.state.as_mut() else {
            return SessionOutcome::None;
        };
        match state.handle_key(key) {
            EditorAction::None => SessionOutcome::None,
            EditorAction::Cancel => self.cancel(),
            EditorAction::Submit => self.commit(store),
            EditorAction::ConfirmDelete => self.confirm_delete(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, PersistenceGateway, DEFAULT_TASKS_KEY};

    #[derive(Default)]
    struct NullSink;

    impl RenderSink for NullSink {
        fn render(&mut self, _tasks: &[Task]) {}
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_text(editor: &mut EditorState, text: &str) {
        for ch in text.chars() {
            editor.handle_key(key(KeyCode::Char(ch)));
        }
    }

    fn store() -> TaskStore<NullSink> {
        let tasks = vec![Task::new(1, "Old", "", TaskStatus::Todo)];
        let raw = serde_json::to_string(&tasks).unwrap();
        let kv = MemoryStore::new().with_entry(DEFAULT_TASKS_KEY, &raw);
        TaskStore::open(PersistenceGateway::new(Box::new(kv)), NullSink)
    }

    #[test]
    fn new_task_starts_blank_in_todo() {
        let editor = EditorState::new_task();
        assert_eq!(editor.title(), "");
        assert_eq!(editor.description(), "");
        assert_eq!(editor.status(), TaskStatus::Todo);
        assert_eq!(editor.active_field(), EditorFieldId::Title);
        assert!(editor.title_error().is_none());
        assert!(!editor.can_delete());
    }

    #[test]
    fn edit_task_prefills_fields() {
        let task = Task::new(4, "Title", "Body", TaskStatus::Doing);
        let editor = EditorState::edit_task(&task);
        assert_eq!(editor.task_id(), Some(4));
        assert_eq!(editor.title(), "Title");
        assert_eq!(editor.description(), "Body");
        assert_eq!(editor.status(), TaskStatus::Doing);
    }

    #[test]
    fn title_indicator_tracks_keystrokes() {
        let mut editor = EditorState::new_task();
        type_text(&mut editor, " ");
        assert_eq!(editor.title_error(), Some(TITLE_REQUIRED));

        type_text(&mut editor, "a");
        assert!(editor.title_error().is_none());

        editor.handle_key(key(KeyCode::Backspace));
        assert_eq!(editor.title_error(), Some(TITLE_REQUIRED));
    }

    #[test]
    fn title_indicator_updates_on_blur_and_focus() {
        let mut editor = EditorState::new_task();
        editor.handle_key(key(KeyCode::Tab));
        assert_eq!(editor.active_field(), EditorFieldId::Description);
        assert_eq!(editor.title_error(), Some(TITLE_REQUIRED));

        editor.title = "filled elsewhere".to_string();
        editor.focus(EditorFieldId::Title);
        assert!(editor.title_error().is_none());
    }

    #[test]
    fn status_cycles_only_on_status_field() {
        let mut editor = EditorState::new_task();
        editor.handle_key(key(KeyCode::Right));
        assert_eq!(editor.status(), TaskStatus::Todo);

        editor.focus(EditorFieldId::Status);
        editor.handle_key(key(KeyCode::Right));
        assert_eq!(editor.status(), TaskStatus::Doing);
        editor.handle_key(key(KeyCode::Left));
        editor.handle_key(key(KeyCode::Left));
        assert_eq!(editor.status(), TaskStatus::Done);
    }

    #[test]
    fn ctrl_u_clears_active_field() {
        let mut editor = EditorState::new_task();
        type_text(&mut editor, "abc");
        editor.handle_key(ctrl('u'));
        assert_eq!(editor.title(), "");
        assert_eq!(editor.title_error(), Some(TITLE_REQUIRED));
    }

    #[test]
    fn whitespace_title_blocks_commit() {
        let mut store = store();
        let before = store.tasks().to_vec();
        let mut session = EditorSession::new();
        session.open_create();
        if let Some(state) = session.state_mut() {
            state.set_title("   ");
        }

        let outcome = session.commit(&mut store);
        assert_eq!(outcome, SessionOutcome::Invalid);
        assert!(session.is_open());
        assert_eq!(
            session.state().and_then(EditorState::title_error),
            Some(TITLE_REQUIRED)
        );
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn whitespace_title_blocks_edit_commit() {
        let mut store = store();
        let before = store.tasks().to_vec();
        let mut session = EditorSession::new();
        session.open_edit(&before[0]);
        if let Some(state) = session.state_mut() {
            state.set_title(" \t ");
        }

        assert_eq!(session.commit(&mut store), SessionOutcome::Invalid);
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn create_commit_closes_session() {
        let mut store = store();
        let mut session = EditorSession::new();
        session.open_create();
        if let Some(state) = session.state_mut() {
            type_text(state, "Buy milk");
        }

        let outcome = session.handle_key(key(KeyCode::Enter), &mut store);
        assert_eq!(
            outcome,
            SessionOutcome::Created(Task::new(2, "Buy milk", "", TaskStatus::Todo))
        );
        assert!(!session.is_open());
        assert_eq!(store.tasks().len(), 2);
    }

    #[test]
    fn edit_commit_updates_task() {
        let mut store = store();
        let task = store.tasks()[0].clone();
        let mut session = EditorSession::new();
        session.open_edit(&task);
        if let Some(state) = session.state_mut() {
            state.set_title("New title");
            state.set_description("desc");
            state.set_status(TaskStatus::Done);
        }

        let outcome = session.commit(&mut store);
        let expected = Task::new(1, "New title", "desc", TaskStatus::Done);
        assert_eq!(outcome, SessionOutcome::Updated(expected.clone()));
        assert_eq!(store.get(1), Some(&expected));
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut store = store();
        let task = store.tasks()[0].clone();
        let mut session = EditorSession::new();
        session.open_edit(&task);

        assert_eq!(session.confirm_delete(&mut store), SessionOutcome::None);
        assert_eq!(store.tasks().len(), 1);

        session.handle_key(ctrl('d'), &mut store);
        assert!(session.state().is_some_and(EditorState::confirming_delete));
        session.handle_key(key(KeyCode::Char('n')), &mut store);
        assert!(session.state().is_some_and(|state| !state.confirming_delete()));
        assert_eq!(store.tasks().len(), 1);

        session.handle_key(ctrl('d'), &mut store);
        let outcome = session.handle_key(key(KeyCode::Char('y')), &mut store);
        assert_eq!(outcome, SessionOutcome::Deleted(1));
        assert!(!session.is_open());
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn delete_unavailable_when_creating() {
        let mut session = EditorSession::new();
        session.open_create();
        let state = session.state_mut().unwrap();
        assert!(!state.request_delete());
        state.handle_key(ctrl('d'));
        assert!(!state.confirming_delete());
    }

    #[test]
    fn cancel_closes_without_mutation() {
        let mut store = store();
        let mut session = EditorSession::new();
        session.open_create();
        if let Some(state) = session.state_mut() {
            type_text(state, "draft");
        }

        let outcome = session.handle_key(key(KeyCode::Esc), &mut store);
        assert_eq!(outcome, SessionOutcome::Cancelled);
        assert!(!session.is_open());
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(session.cancel(), SessionOutcome::None);
    }

    #[test]
    fn editing_a_deleted_task_reports_missing() {
        let mut store = store();
        let task = store.tasks()[0].clone();
        let mut session = EditorSession::new();
        session.open_edit(&task);
        store.delete(task.id);

        assert_eq!(session.commit(&mut store), SessionOutcome::Missing(1));
        assert!(!session.is_open());
        assert!(store.tasks().is_empty());
    }
}
