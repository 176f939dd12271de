//! Modal dialogs: blocking alert, delete confirmation, new-task input.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::theme;
use crate::app::App;

/// Render the blocking alert over the board.
pub fn render_alert(frame: &mut Frame, app: &App) {
    let message = app.current_alert().unwrap_or_default();
    let area = centered_rect(50, 20, frame.area());

    let lines = vec![
        Line::from(Span::styled(message.to_string(), theme::normal())),
        Line::default(),
        Line::from(Span::styled("[ OK ]", theme::bold())).centered(),
    ];

    let block = Block::default()
        .title(" Alert ")
        .borders(Borders::ALL)
        .border_style(theme::alert_border());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

/// Render the delete confirmation prompt.
pub fn render_confirm(frame: &mut Frame, app: &App) {
    let title = app
        .selected_task()
        .map_or_else(|| "this task".to_string(), |t| format!("\"{}\"", t.title));
    let area = centered_rect(50, 20, frame.area());

    let lines = vec![
        Line::from(Span::styled(
            format!("Are you sure you want to delete {title}?"),
            theme::normal(),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled("[y]", theme::bold()),
            Span::styled(" delete   ", theme::normal()),
            Span::styled("[n]", theme::bold()),
            Span::styled(" cancel", theme::normal()),
        ])
        .centered(),
    ];

    let block = Block::default()
        .title(" Confirm ")
        .borders(Borders::ALL)
        .border_style(theme::dialog_border());

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

/// Render the new-task input line.
pub fn render_create(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 15, frame.area());

    // Build the input text with cursor.
    let mut display_text = app.input.clone();
    if app.cursor_position >= display_text.len() {
        display_text.push('█');
    } else {
        display_text.insert(app.cursor_position, '█');
    }

    let lines = vec![
        Line::from(Span::styled(display_text, theme::normal())),
        Line::default(),
        Line::from(Span::styled(
            format!(
                "Enter: create in {}   Esc: cancel",
                app.selected_status().label()
            ),
            theme::dimmed(),
        )),
    ];

    let block = Block::default()
        .title(" New task ")
        .borders(Borders::ALL)
        .border_style(theme::dialog_border());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

/// A rectangle centered in `r`, sized by percentage of each dimension.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
