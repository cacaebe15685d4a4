//! Board rendering: one lane per visible column, cards stacked inside.
//!
//! While drawing, every lane and card registers the rectangle it
//! actually occupies in the app's [`HitMap`](crate::board::HitMap), so
//! pointer events are resolved against the same geometry the user sees.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use taskdeck_proto::task::{Task, TaskPriority};

use super::theme;
use crate::app::App;
use crate::board::hit::{GHOST_HEIGHT, GHOST_WIDTH};
use crate::board::DropTarget;

/// Height of one card, borders included.
const CARD_HEIGHT: u16 = 3;

/// Render the board into `area`.
pub fn render(frame: &mut Frame, area: Rect, app: &mut App) {
    let target = app.active_target();
    let dragged = app.engine.dragged_task();
    let cursor = app.cursor;
    let pointer = app.pointer;

    let App {
        engine,
        hit,
        due_format,
        ..
    } = app;
    hit.clear();

    let columns = engine.columns();
    if columns.is_empty() {
        return;
    }
    let lane_count = u32::try_from(columns.len()).unwrap_or(1);
    let constraints = vec![Constraint::Ratio(1, lane_count); columns.len()];
    let lanes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (col_idx, (lane_area, column)) in lanes.iter().zip(&columns).enumerate() {
        hit.push_column(*lane_area, column.status);

        let is_drop_target = target == Some(DropTarget::Column(column.status));
        let title = Line::from(vec![
            Span::styled(
                format!(" {} ", column.status.label()),
                theme::lane_title(column.status),
            ),
            Span::styled(format!("({}) ", column.tasks.len()), theme::count_badge()),
        ]);
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(if is_drop_target {
                BorderType::Double
            } else {
                BorderType::Plain
            })
            .border_style(if is_drop_target {
                theme::highlighted()
            } else {
                theme::dimmed()
            });
        let inner = block.inner(*lane_area);
        frame.render_widget(block, *lane_area);

        let mut y = inner.y;
        for (row_idx, task) in column.tasks.iter().enumerate() {
            if y + CARD_HEIGHT > inner.y + inner.height {
                let hidden = column.tasks.len() - row_idx;
                if inner.y + inner.height > y {
                    let more = Rect::new(inner.x, y, inner.width, 1);
                    frame.render_widget(
                        Paragraph::new(format!("… {hidden} more")).style(theme::dimmed()),
                        more,
                    );
                }
                break;
            }
            let card_area = Rect::new(inner.x, y, inner.width, CARD_HEIGHT);
            hit.push_card(card_area, task.id);

            let is_cursor = cursor.column == col_idx && cursor.row == row_idx;
            let border = if target == Some(DropTarget::Card(task.id)) {
                (BorderType::Double, theme::highlighted())
            } else if dragged == Some(task.id) {
                (BorderType::Plain, theme::lifted())
            } else if is_cursor {
                (BorderType::Plain, theme::highlighted())
            } else {
                (BorderType::Plain, theme::normal())
            };
            render_card(frame, card_area, task, border, due_format);
            y += CARD_HEIGHT;
        }
    }

    // Floating ghost follows the pointer during a mouse drag.
    if let (Some((x, y)), Some(id)) = (pointer, dragged)
        && let Some(task) = engine.tasks().iter().find(|t| t.id == id)
    {
        render_ghost(frame, x, y, task);
    }
}

fn render_card(
    frame: &mut Frame,
    area: Rect,
    task: &Task,
    (border_type, border_style): (BorderType, Style),
    due_format: &str,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut spans = Vec::new();
    let marker = priority_marker(task.priority);
    if !marker.is_empty() {
        spans.push(Span::styled(
            marker,
            Style::default().fg(theme::priority_color(task.priority)),
        ));
    }
    spans.push(Span::styled(task.title.clone(), theme::normal()));
    if let Some(due_ms) = task.due_ms {
        spans.push(Span::styled(
            format!(" · {}", format_due(due_ms, due_format)),
            theme::dimmed(),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_ghost(frame: &mut Frame, x: u16, y: u16, task: &Task) {
    let ghost = Rect {
        x: x.saturating_sub(GHOST_WIDTH / 2),
        y: y.saturating_sub(GHOST_HEIGHT / 2),
        width: GHOST_WIDTH,
        height: GHOST_HEIGHT,
    };
    let ghost = frame.area().intersection(ghost);
    if ghost.width == 0 || ghost.height == 0 {
        return;
    }
    frame.render_widget(Clear, ghost);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::ghost());
    let inner = block.inner(ghost);
    frame.render_widget(block, ghost);
    frame.render_widget(
        Paragraph::new(task.title.clone()).style(theme::ghost()),
        inner,
    );
}

const fn priority_marker(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::Urgent => "‼ ",
        TaskPriority::High => "! ",
        TaskPriority::Medium | TaskPriority::Low => "",
    }
}

/// Format an epoch-millisecond due date with the configured pattern.
fn format_due(ms: u64, format: &str) -> String {
    use chrono::{Local, TimeZone};
    let secs = (ms / 1000).cast_signed();
    match Local.timestamp_opt(secs, 0) {
        chrono::LocalResult::Single(dt) => dt.format(format).to_string(),
        _ => "?".to_string(),
    }
}
