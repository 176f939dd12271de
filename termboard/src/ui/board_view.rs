//! Board rendering: one bordered column per status, cards as list items.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use termboard_proto::task::{Priority, Task, TaskStatus};

use super::theme;
use crate::app::App;

/// Render the four status columns side by side.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    for (i, column) in app.board.columns().iter().enumerate() {
        render_column(frame, chunks[i], app, column.status, &column.cards, i);
    }
}

/// Render a single column.
fn render_column(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    status: TaskStatus,
    cards: &[Task],
    column_index: usize,
) {
    let is_selected = app.selected_column == column_index;
    let is_drop_target = app.controller.hover_target() == Some(status);
    let dragged = app.controller.dragged_card();

    let items: Vec<ListItem> = cards
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let is_cursor = is_selected && i == app.selected_card;
            let is_lifted = dragged == Some(task.id);

            let base = if is_lifted {
                theme::lifted()
            } else if is_cursor {
                theme::selected()
            } else {
                theme::normal()
            };

            let mut spans = vec![
                Span::styled(
                    priority_marker(task.priority),
                    base.fg(theme::priority_color(task.priority)),
                ),
                Span::raw(" "),
                Span::styled(task.title.clone(), base),
            ];
            if app.controller.has_pending(task.id) {
                spans.push(Span::raw(" "));
                spans.push(Span::styled("↻", theme::pending()));
            }
            if let Some(deadline) = task.deadline {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(
                    format!("({})", deadline.format(&app.date_format)),
                    theme::dimmed(),
                ));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    // The drop-target highlight wins over plain selection so the user
    // can see which column a held card would land in.
    let border_style = if is_drop_target {
        theme::drop_target()
    } else if is_selected {
        theme::highlighted()
    } else {
        theme::normal()
    };

    let title = format!(" {} ({}) ", status.label(), cards.len());
    let block = Block::default()
        .title(Span::styled(
            title,
            theme::panel_title(theme::status_color(status)),
        ))
        .borders(Borders::ALL)
        .border_style(border_style);

    let list = List::new(items).block(block);
    frame.render_widget(list, area);
}

/// Marker glyph for a card's priority.
const fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "▲",
        Priority::Medium => "■",
        Priority::Low => "▽",
    }
}
