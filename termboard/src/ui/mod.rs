//! Terminal UI rendering.

pub mod board_view;
pub mod dialog;
pub mod status_bar;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::app::{App, Mode};

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    // Board above, one-line status bar below.
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    board_view::render(frame, main_chunks[0], app);
    status_bar::render(frame, main_chunks[1], app);

    // Modal surfaces draw over the board and own the keyboard.
    match app.mode {
        Mode::Alert => dialog::render_alert(frame, app),
        Mode::ConfirmDelete(_) => dialog::render_confirm(frame, app),
        Mode::CreateTask => dialog::render_create(frame, app),
        Mode::Normal => {}
    }
}
