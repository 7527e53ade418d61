use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::board::Board;
use crate::error::Result;
use crate::task::{TaskStatus, TaskStore, UpdateOutcome};

use super::editor::{EditorSession, SessionOutcome};
use super::view;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatusKind {
    Error,
    Info,
}

pub struct AppState {
    pub(crate) store: TaskStore<Board>,
    pub(crate) session: EditorSession,
    pub(crate) column: TaskStatus,
    pub(crate) row: usize,
    pub(crate) show_help: bool,
    status_message: Option<(String, StatusKind)>,
}

impl AppState {
    pub fn new(store: TaskStore<Board>) -> Self {
        Self {
            store,
            session: EditorSession::new(),
            column: TaskStatus::Todo,
            row: 0,
            show_help: false,
            status_message: None,
        }
    }

    pub(crate) fn board(&self) -> &Board {
        self.store.renderer()
    }

    pub(crate) fn status_line(&self) -> Option<(&str, StatusKind)> {
        self.status_message
            .as_ref()
            .map(|(message, kind)| (message.as_str(), *kind))
    }

    pub(crate) fn footer_hint(&self) -> &'static str {
        if let Some(editor) = self.session.state() {
            if editor.confirming_delete() {
                return "y confirm delete  n/esc keep task";
            }
            if editor.can_delete() {
                return "tab next field  left/right status  enter save  ctrl+d delete  esc cancel";
            }
            return "tab next field  left/right status  enter save  esc cancel";
        }
        "h/l column  j/k move  n new  enter edit  </> move task  d delete  ? help  q quit"
    }

    pub(crate) fn count_summary(&self) -> String {
        self.board()
            .columns()
            .iter()
            .map(|column| format!("{}: {}", column.status, column.count()))
            .collect::<Vec<_>>()
            .join("  ")
    }

    fn set_error(&mut self, message: String) {
        self.status_message = Some((message, StatusKind::Error));
    }

    fn set_info(&mut self, message: String) {
        self.status_message = Some((message, StatusKind::Info));
    }

    fn column_len(&self) -> usize {
        self.board().count(self.column)
    }

    fn clamp_row(&mut self) {
        let len = self.column_len();
        if len == 0 {
            self.row = 0;
        } else if self.row >= len {
            self.row = len - 1;
        }
    }

    fn move_row(&mut self, delta: isize) {
        let len = self.column_len();
        if len == 0 {
            self.row = 0;
            return;
        }
        let max = (len - 1) as isize;
        self.row = (self.row as isize + delta).clamp(0, max) as usize;
    }

    fn move_column(&mut self, delta: isize) {
        self.column = if delta > 0 {
            self.column.next()
        } else {
            self.column.prev()
        };
        self.clamp_row();
    }

    /// Put the cursor on a task wherever the last render placed it
    fn select_task(&mut self, task_id: u64) {
        if let Some((status, row)) = self.board().position_of(task_id) {
            self.column = status;
            self.row = row;
        } else {
            self.clamp_row();
        }
    }

    fn selected_task_id(&self) -> Option<u64> {
        self.board()
            .edit_request(self.column, self.row)
            .map(|request| request.task_id)
    }

    fn open_editor_on_selection(&mut self) -> bool {
        let Some(request) = self.board().edit_request(self.column, self.row) else {
            self.set_error("no task selected".to_string());
            return false;
        };
        let Some(task) = self.store.get(request.task_id).cloned() else {
            self.set_error(format!("task #{} no longer exists", request.task_id));
            return false;
        };
        self.session.open_edit(&task);
        true
    }

    /// Shift the selected task one column left or right
    fn shift_selected(&mut self, forward: bool) {
        let Some(task) = self
            .selected_task_id()
            .and_then(|id| self.store.get(id))
            .cloned()
        else {
            self.set_error("no task selected".to_string());
            return;
        };
        let status = if forward {
            task.status.next()
        } else {
            task.status.prev()
        };
        match self
            .store
            .update(task.id, &task.title, &task.description, status)
        {
            Ok(UpdateOutcome::Updated(task)) => {
                self.select_task(task.id);
                self.set_info(format!("moved #{} to {}", task.id, task.status));
            }
            Ok(UpdateOutcome::NotFound) => {
                self.clamp_row();
                self.set_error(format!("task #{} no longer exists", task.id));
            }
            Err(err) => self.set_error(err.to_string()),
        }
    }

    fn apply_outcome(&mut self, outcome: SessionOutcome) {
        match &outcome {
            SessionOutcome::Created(task) | SessionOutcome::Updated(task) => {
                self.select_task(task.id)
            }
            SessionOutcome::Deleted(_) | SessionOutcome::Missing(_) => self.clamp_row(),
            _ => {}
        }
        let is_error = matches!(
            outcome,
            SessionOutcome::Failed(_) | SessionOutcome::Missing(_)
        );
        if let Some(message) = outcome.message() {
            if is_error {
                self.set_error(message);
            } else {
                self.set_info(message);
            }
        }
    }

    /// Handle one key; returns true when the viewer should exit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        if self.session.is_open() {
            let outcome = self.session.handle_key(key, &mut self.store);
            self.apply_outcome(outcome);
            return false;
        }

        if self.show_help {
            self.show_help = false;
            if key.code == KeyCode::Char('?') || key.code == KeyCode::Esc {
                return false;
            }
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('h') | KeyCode::Left => self.move_column(-1),
            KeyCode::Char('l') | KeyCode::Right => self.move_column(1),
            KeyCode::Char('j') | KeyCode::Down => self.move_row(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_row(-1),
            KeyCode::Char('1') => {
                self.column = TaskStatus::Todo;
                self.clamp_row();
            }
            KeyCode::Char('2') => {
                self.column = TaskStatus::Doing;
                self.clamp_row();
            }
            KeyCode::Char('3') => {
                self.column = TaskStatus::Done;
                self.clamp_row();
            }
            KeyCode::Char('n') => self.session.open_create(),
            KeyCode::Char('e') | KeyCode::Enter => {
                self.open_editor_on_selection();
            }
            KeyCode::Char('d') => {
                if self.open_editor_on_selection() {
                    if let Some(editor) = self.session.state_mut() {
                        editor.request_delete();
                    }
                }
            }
            KeyCode::Char('>') | KeyCode::Char('L') => self.shift_selected(true),
            KeyCode::Char('<') | KeyCode::Char('H') => self.shift_selected(false),
            _ => {}
        }
        false
    }
}

/// Run the interactive board until the user quits
pub fn run(store: TaskStore<Board>) -> Result<()> {
    let mut app = AppState::new(store);
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    let mut dirty = true;
    loop {
        if dirty {
            terminal.draw(|frame| view::render(frame, app))?;
            dirty = false;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.handle_key(key) {
                    break;
                }
                dirty = true;
            }
            Event::Resize(_, _) => dirty = true,
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, PersistenceGateway, DEFAULT_TASKS_KEY};
    use crate::task::Task;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with(tasks: &[Task]) -> AppState {
        let raw = serde_json::to_string(tasks).unwrap();
        let kv = MemoryStore::new().with_entry(DEFAULT_TASKS_KEY, &raw);
        AppState::new(TaskStore::open(
            PersistenceGateway::new(Box::new(kv)),
            Board::default(),
        ))
    }

    fn press_text(app: &mut AppState, text: &str) {
        for ch in text.chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn new_task_starts_in_todo_from_any_column() {
        let mut app = app_with(&[Task::new(1, "a", "", TaskStatus::Todo)]);
        app.handle_key(key(KeyCode::Char('l')));
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(
            app.session.state().map(|editor| editor.status()),
            Some(TaskStatus::Todo)
        );

        press_text(&mut app, "Write docs");
        app.handle_key(key(KeyCode::Enter));

        assert!(!app.session.is_open());
        assert_eq!(app.board().count(TaskStatus::Todo), 2);
        assert_eq!(app.board().count(TaskStatus::Doing), 0);
        assert_eq!(app.column, TaskStatus::Todo);
        assert_eq!(app.selected_task_id(), Some(2));
        assert_eq!(app.status_line(), Some(("created #2", StatusKind::Info)));
    }

    #[test]
    fn new_task_status_follows_explicit_cycling() {
        let mut app = app_with(&[Task::new(1, "a", "", TaskStatus::Todo)]);
        app.handle_key(key(KeyCode::Char('3')));
        app.handle_key(key(KeyCode::Char('n')));
        press_text(&mut app, "Deploy");
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.store.get(2).map(|task| task.status), Some(TaskStatus::Doing));
        assert_eq!(app.column, TaskStatus::Doing);
    }

    #[test]
    fn blank_title_keeps_editor_open() {
        let mut app = app_with(&[Task::new(1, "a", "", TaskStatus::Todo)]);
        app.handle_key(key(KeyCode::Char('n')));
        press_text(&mut app, "   ");
        app.handle_key(key(KeyCode::Enter));

        assert!(app.session.is_open());
        assert_eq!(app.store.tasks().len(), 1);
    }

    #[test]
    fn shifting_moves_task_and_follows_it() {
        let mut app = app_with(&[
            Task::new(1, "a", "", TaskStatus::Todo),
            Task::new(2, "b", "", TaskStatus::Todo),
        ]);
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char('>')));

        assert_eq!(app.store.get(2).map(|task| task.status), Some(TaskStatus::Doing));
        assert_eq!(app.column, TaskStatus::Doing);
        assert_eq!(app.board().count(TaskStatus::Todo), 1);
        assert_eq!(app.count_summary(), "todo: 1  doing: 1  done: 0");
    }

    #[test]
    fn delete_key_asks_before_removing() {
        let mut app = app_with(&[Task::new(1, "a", "", TaskStatus::Todo)]);
        app.handle_key(key(KeyCode::Char('d')));
        assert!(app
            .session
            .state()
            .is_some_and(|editor| editor.confirming_delete()));
        assert_eq!(app.store.tasks().len(), 1);

        app.handle_key(key(KeyCode::Char('y')));
        assert!(app.store.tasks().is_empty());
        assert_eq!(app.row, 0);
    }

    #[test]
    fn edit_on_empty_column_reports_error() {
        let mut app = app_with(&[Task::new(1, "a", "", TaskStatus::Todo)]);
        app.handle_key(key(KeyCode::Char('3')));
        app.handle_key(key(KeyCode::Enter));

        assert!(!app.session.is_open());
        assert_eq!(
            app.status_line(),
            Some(("no task selected", StatusKind::Error))
        );
    }

    #[test]
    fn quit_keys_exit_only_outside_editor() {
        let mut app = app_with(&[Task::new(1, "a", "", TaskStatus::Todo)]);
        app.handle_key(key(KeyCode::Char('n')));
        assert!(!app.handle_key(key(KeyCode::Char('q'))));
        assert!(!app.handle_key(key(KeyCode::Esc)));
        assert!(app.handle_key(key(KeyCode::Char('q'))));
    }
}
