//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, Mode};
use crate::board::drag::DragPhase;

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match app.mode {
        Mode::Alert => "Enter/Esc: dismiss",
        Mode::ConfirmDelete(_) => "y: delete | n: cancel",
        Mode::CreateTask => "Enter: create | Esc: cancel",
        Mode::Normal => match app.controller.phase() {
            DragPhase::Dragging => "←→/hl: choose column | Space: drop | Esc: put back",
            _ => "←→↑↓/hjkl: navigate | Space: pick up | n: new | d: delete | r: refresh | q: quit",
        },
    };

    let (dot_color, status_text) = if app.connected {
        (theme::SUCCESS, "Connected".to_string())
    } else {
        (theme::OFFLINE, "Offline".to_string())
    };

    let mut spans = vec![
        Span::styled("TermBoard v0.1.0", theme::bold()),
        Span::raw(" | "),
        Span::styled("●", theme::normal().fg(dot_color)),
        Span::raw(format!(" {status_text}")),
    ];

    let pending = app.controller.pending_count();
    if pending > 0 {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("↻ {pending} syncing"),
            theme::pending(),
        ));
    }

    if let Some(ref notice) = app.notice {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(notice.clone(), theme::dimmed()));
    }

    spans.push(Span::raw(" | "));
    spans.push(Span::styled(help_text, theme::dimmed()));

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
