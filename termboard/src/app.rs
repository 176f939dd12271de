//! Application state and event handling.

use std::collections::VecDeque;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use termboard_proto::task::{
    MAX_TASK_TITLE_LENGTH, Task, TaskId, TaskStatus, validate_title,
};
use termboard_proto::wire::CreateTaskRequest;

use crate::board::drag::{DragController, DropOutcome};
use crate::board::model::Board;
use crate::net::{SyncCommand, SyncEvent};

/// Which modal surface currently owns the keyboard.
///
/// `Alert` and `ConfirmDelete` are the terminal renditions of the
/// browser's blocking `alert()` and `confirm()` dialogs: while one is
/// up, board keys are swallowed until the user answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The board has the keyboard (default).
    Normal,
    /// A blocking alert is up; the text is the front of the alert
    /// queue. Enter, Space, or Esc dismisses it.
    Alert,
    /// Awaiting a yes/no answer before deleting the given task.
    ConfirmDelete(TaskId),
    /// The new-task input line is active.
    CreateTask,
}

/// Main application state.
pub struct App {
    /// The kanban board.
    pub board: Board,
    /// Drag state machine and rollback bookkeeping.
    pub controller: DragController,
    /// Which surface owns the keyboard.
    pub mode: Mode,
    /// Selected column index into [`TaskStatus::ALL`].
    pub selected_column: usize,
    /// Selected card index within the selected column.
    pub selected_card: usize,
    /// Current text input (new-task title).
    pub input: String,
    /// Cursor position in input (character index).
    pub cursor_position: usize,
    /// Queued alert texts; the front is the one displayed. Alerts are
    /// blocking and dismissed one at a time, oldest first.
    pub alerts: VecDeque<String>,
    /// Transient status-line notice (non-blocking).
    pub notice: Option<String>,
    /// Whether a server session is established.
    pub connected: bool,
    /// Deadline display format string (chrono).
    pub date_format: String,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl App {
    /// Create a new application with an empty board.
    #[must_use]
    pub fn new(date_format: String) -> Self {
        Self {
            board: Board::new(),
            controller: DragController::new(),
            mode: Mode::Normal,
            selected_column: 0,
            selected_card: 0,
            input: String::new(),
            cursor_position: 0,
            alerts: VecDeque::new(),
            notice: None,
            connected: false,
            date_format,
            should_quit: false,
        }
    }

    /// Replace the board with the offline sample tasks.
    pub fn load_sample_board(&mut self) {
        self.board = Board::from_tasks(sample_tasks());
        self.clamp_selection();
    }

    /// The status of the currently selected column.
    #[must_use]
    pub fn selected_status(&self) -> TaskStatus {
        TaskStatus::ALL
            .get(self.selected_column)
            .copied()
            .unwrap_or(TaskStatus::Draft)
    }

    /// The currently selected card, if the selected column has one.
    #[must_use]
    pub fn selected_task(&self) -> Option<&Task> {
        self.board
            .column(self.selected_status())
            .cards
            .get(self.selected_card)
    }

    /// The alert currently displayed, if any.
    #[must_use]
    pub fn current_alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    /// Handle a key event. Returns a command when the action requires
    /// server dispatch.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        // Ctrl-C always quits, whatever surface owns the keyboard.
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            self.should_quit = true;
            return None;
        }

        match self.mode {
            Mode::Alert => {
                self.handle_alert_key(key);
                None
            }
            Mode::ConfirmDelete(task_id) => self.handle_confirm_key(key, task_id),
            Mode::CreateTask => self.handle_create_key(key),
            Mode::Normal => self.handle_board_key(key),
        }
    }

    /// Apply a sync event from the background worker.
    pub fn apply_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::SessionOpened => {
                self.connected = true;
                self.notice = Some("Connected to server".to_string());
            }
            SyncEvent::SessionFailed { detail } => {
                self.connected = false;
                self.notice = Some(format!("Offline: {detail}"));
            }
            SyncEvent::BoardFetched(tasks) => {
                self.board = Board::from_tasks(tasks);
                self.clamp_selection();
                self.notice = Some("Board refreshed".to_string());
            }
            SyncEvent::TaskCreated(task) => {
                let status = task.status;
                self.board.append_card(status, task);
                self.notice = Some("Task created".to_string());
            }
            SyncEvent::UpdateResolved {
                generation,
                task_id: _,
                outcome,
            } => {
                if let Some(failure) =
                    self.controller
                        .complete_drop(&mut self.board, generation, &outcome)
                {
                    self.push_alert(failure.message);
                }
                self.clamp_selection();
            }
            SyncEvent::DeleteResolved {
                task_id,
                error: None,
            } => {
                self.board.remove_card(task_id);
                self.clamp_selection();
                self.notice = Some("Task deleted".to_string());
            }
            SyncEvent::DeleteResolved {
                task_id: _,
                error: Some(detail),
            } => {
                self.push_alert(format!("Failed to delete task: {detail}"));
            }
            SyncEvent::Error(detail) => {
                self.notice = Some(detail);
            }
        }
    }

    /// Resolve a command locally when no server is configured.
    ///
    /// Status updates confirm immediately (the optimistic move simply
    /// stands), deletes succeed, and created tasks get the next free
    /// id. This keeps the controller's bookkeeping identical to the
    /// online path.
    pub fn resolve_offline(&mut self, command: SyncCommand) {
        match command {
            SyncCommand::UpdateStatus {
                generation,
                task_id,
                ..
            } => {
                self.apply_sync_event(SyncEvent::UpdateResolved {
                    generation,
                    task_id,
                    outcome: DropOutcome::Confirmed,
                });
            }
            SyncCommand::DeleteTask(task_id) => {
                self.apply_sync_event(SyncEvent::DeleteResolved {
                    task_id,
                    error: None,
                });
            }
            SyncCommand::CreateTask(draft) => {
                let next_id = self
                    .board
                    .all_tasks()
                    .map(|t| t.id.as_u64())
                    .max()
                    .unwrap_or(0)
                    + 1;
                let task = Task {
                    id: TaskId::new(next_id),
                    title: draft.title,
                    status: draft.status.unwrap_or(TaskStatus::Draft),
                    priority: draft.priority.unwrap_or_default(),
                    deadline: draft.deadline,
                    created_at: 0,
                };
                self.apply_sync_event(SyncEvent::TaskCreated(task));
            }
            SyncCommand::OpenSession | SyncCommand::RefreshBoard | SyncCommand::Shutdown => {}
        }
    }

    /// Resolve a command that could not be handed to the sync worker.
    ///
    /// A drop whose update never leaves the client is a failed drop:
    /// the card rolls back and the user is told, exactly as if the
    /// request had died on the wire.
    pub fn fail_undispatched(&mut self, command: SyncCommand) {
        match command {
            SyncCommand::UpdateStatus {
                generation,
                task_id,
                ..
            } => {
                self.apply_sync_event(SyncEvent::UpdateResolved {
                    generation,
                    task_id,
                    outcome: DropOutcome::NetworkError {
                        detail: "sync channel unavailable".to_string(),
                    },
                });
            }
            SyncCommand::DeleteTask(task_id) => {
                self.apply_sync_event(SyncEvent::DeleteResolved {
                    task_id,
                    error: Some("sync channel unavailable".to_string()),
                });
            }
            SyncCommand::CreateTask(_)
            | SyncCommand::OpenSession
            | SyncCommand::RefreshBoard
            | SyncCommand::Shutdown => {
                self.notice = Some("Sync busy, command not sent".to_string());
            }
        }
    }

    /// Queue an alert and give it the keyboard.
    pub fn push_alert(&mut self, message: String) {
        self.alerts.push_back(message);
        self.mode = Mode::Alert;
    }

    /// Dismiss the displayed alert; the next queued one (if any) takes
    /// its place.
    fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
        if self.alerts.is_empty() {
            self.mode = Mode::Normal;
        }
    }

    /// Handle key event while an alert is up. Everything except the
    /// dismissal keys is swallowed.
    fn handle_alert_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => self.dismiss_alert(),
            _ => {}
        }
    }

    /// Handle key event while awaiting delete confirmation.
    fn handle_confirm_key(&mut self, key: KeyEvent, task_id: TaskId) -> Option<SyncCommand> {
        match key.code {
            KeyCode::Char('y' | 'Y') | KeyCode::Enter => {
                self.mode = Mode::Normal;
                Some(SyncCommand::DeleteTask(task_id))
            }
            KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                self.mode = Mode::Normal;
                None
            }
            _ => None,
        }
    }

    /// Handle key event while the new-task input is active.
    fn handle_create_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        match key.code {
            KeyCode::Enter => self.submit_new_task(),
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.input.clear();
                self.cursor_position = 0;
                None
            }
            KeyCode::Char(c) => {
                self.enter_char(c);
                None
            }
            KeyCode::Backspace => {
                self.delete_char();
                None
            }
            KeyCode::Left => {
                self.move_cursor_left();
                None
            }
            KeyCode::Right => {
                self.move_cursor_right();
                None
            }
            KeyCode::Home => {
                self.cursor_position = 0;
                None
            }
            KeyCode::End => {
                self.cursor_position = self.input.len();
                None
            }
            _ => None,
        }
    }

    /// Handle key event when the board has the keyboard.
    fn handle_board_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Esc => {
                // Put the card back down without dropping it.
                self.controller.end_drag();
                None
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.select_column_left();
                None
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.select_column_right();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_card_up();
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_card_down();
                None
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.pick_up_or_drop(),
            KeyCode::Char('d') => {
                if let Some(task) = self.selected_task() {
                    self.mode = Mode::ConfirmDelete(task.id);
                }
                None
            }
            KeyCode::Char('n') => {
                self.mode = Mode::CreateTask;
                self.input.clear();
                self.cursor_position = 0;
                None
            }
            KeyCode::Char('r') => Some(SyncCommand::RefreshBoard),
            _ => None,
        }
    }

    /// Space/Enter on the board: pick up the selected card, or drop
    /// the held one on the selected column.
    fn pick_up_or_drop(&mut self) -> Option<SyncCommand> {
        if self.controller.session().is_some() {
            let target = self.selected_status();
            let update = self.controller.handle_drop(&mut self.board, target, None)?;
            // Follow the card to its new position.
            self.selected_column = column_index(update.status);
            self.selected_card = self.board.column(update.status).len().saturating_sub(1);
            return Some(SyncCommand::UpdateStatus {
                generation: update.generation,
                task_id: update.task_id,
                status: update.status,
            });
        }

        if let Some(task) = self.selected_task() {
            let id = task.id;
            self.controller.begin_drag(&self.board, id);
            // The card's own column is the initial drop target.
            self.controller.drag_over(self.selected_status());
        }
        None
    }

    /// Submit the current input as a new task in the selected column.
    fn submit_new_task(&mut self) -> Option<SyncCommand> {
        let title = self.input.trim().to_string();
        if title.is_empty() {
            return None;
        }
        if let Err(e) = validate_title(&title) {
            self.notice = Some(e.to_string());
            return None;
        }

        self.mode = Mode::Normal;
        self.input.clear();
        self.cursor_position = 0;

        Some(SyncCommand::CreateTask(CreateTaskRequest {
            title,
            status: Some(self.selected_status()),
            priority: None,
            deadline: None,
        }))
    }

    /// Move the column selection left, updating the drop-target
    /// highlight when a card is held.
    fn select_column_left(&mut self) {
        if self.selected_column > 0 {
            self.selected_column -= 1;
        }
        self.after_column_change();
    }

    /// Move the column selection right.
    fn select_column_right(&mut self) {
        if self.selected_column < TaskStatus::ALL.len() - 1 {
            self.selected_column += 1;
        }
        self.after_column_change();
    }

    fn after_column_change(&mut self) {
        self.clamp_selection();
        if self.controller.session().is_some() {
            self.controller.drag_over(self.selected_status());
        }
    }

    /// Move the card selection up within the column.
    const fn select_card_up(&mut self) {
        if self.selected_card > 0 {
            self.selected_card -= 1;
        }
    }

    /// Move the card selection down within the column.
    fn select_card_down(&mut self) {
        let len = self.board.column(self.selected_status()).len();
        if self.selected_card + 1 < len {
            self.selected_card += 1;
        }
    }

    /// Keep the card selection within the selected column's bounds.
    fn clamp_selection(&mut self) {
        let len = self.board.column(self.selected_status()).len();
        if self.selected_card >= len {
            self.selected_card = len.saturating_sub(1);
        }
    }

    /// Insert a character at the cursor position, capped at the
    /// maximum title length.
    fn enter_char(&mut self, c: char) {
        if self.input.chars().count() >= MAX_TASK_TITLE_LENGTH {
            return;
        }
        self.input.insert(self.cursor_position, c);
        self.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor.
    fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let prev = self.input[..self.cursor_position]
                .chars()
                .next_back()
                .map_or(0, char::len_utf8);
            self.cursor_position -= prev;
            self.input.remove(self.cursor_position);
        }
    }

    /// Move cursor left one character.
    fn move_cursor_left(&mut self) {
        let prev = self.input[..self.cursor_position]
            .chars()
            .next_back()
            .map_or(0, char::len_utf8);
        self.cursor_position -= prev;
    }

    /// Move cursor right one character.
    fn move_cursor_right(&mut self) {
        let next = self.input[self.cursor_position..]
            .chars()
            .next()
            .map_or(0, char::len_utf8);
        self.cursor_position += next;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new("%Y-%m-%d".to_string())
    }
}

/// Returns the column index of `status` in [`TaskStatus::ALL`].
#[must_use]
pub fn column_index(status: TaskStatus) -> usize {
    TaskStatus::ALL
        .iter()
        .position(|s| *s == status)
        .unwrap_or(0)
}

/// Sample tasks for offline mode.
#[must_use]
pub fn sample_tasks() -> Vec<Task> {
    use chrono::NaiveDate;
    use termboard_proto::task::Priority;

    vec![
        Task {
            id: TaskId::new(1),
            title: "Sketch the onboarding flow".to_string(),
            status: TaskStatus::Draft,
            priority: Priority::Medium,
            deadline: NaiveDate::from_ymd_opt(2026, 9, 1),
            created_at: 1_754_000_000_000,
        },
        Task {
            id: TaskId::new(2),
            title: "Collect beta feedback".to_string(),
            status: TaskStatus::Draft,
            priority: Priority::Low,
            deadline: None,
            created_at: 1_754_100_000_000,
        },
        Task {
            id: TaskId::new(3),
            title: "Fix the login redirect loop".to_string(),
            status: TaskStatus::InProgress,
            priority: Priority::High,
            deadline: NaiveDate::from_ymd_opt(2026, 8, 28),
            created_at: 1_754_200_000_000,
        },
        Task {
            id: TaskId::new(4),
            title: "Write release notes".to_string(),
            status: TaskStatus::InProgress,
            priority: Priority::Medium,
            deadline: None,
            created_at: 1_754_300_000_000,
        },
        Task {
            id: TaskId::new(5),
            title: "Migrate CI to the new runners".to_string(),
            status: TaskStatus::Completed,
            priority: Priority::Medium,
            deadline: None,
            created_at: 1_754_400_000_000,
        },
        Task {
            id: TaskId::new(6),
            title: "Archive the 1.x docs".to_string(),
            status: TaskStatus::Archived,
            priority: Priority::Low,
            deadline: None,
            created_at: 1_754_500_000_000,
        },
    ]
}
