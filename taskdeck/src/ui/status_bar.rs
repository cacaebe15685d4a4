//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::App;
use crate::board::DragPhase;

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = if app.grabbed {
        "↑↓←→/hjkl: aim | Space/Enter: drop | Esc: cancel"
    } else if app.engine.dragged_task().is_some() {
        "release to drop | Esc: cancel"
    } else {
        "Space: lift | ↑↓←→/hjkl: navigate | r: refresh | q: quit"
    };

    let (dot_color, status_text) = if !app.is_connected {
        (theme::OFFLINE, "Disconnected".to_string())
    } else if app.store_label == "local" {
        (theme::WARNING, "Local board".to_string())
    } else {
        (
            theme::SUCCESS,
            format!("Connected via {}", app.store_label),
        )
    };

    let mut spans = vec![
        Span::styled("TaskDeck v0.1.0", theme::bold()),
        Span::raw(" | "),
        Span::styled("●", theme::normal().fg(dot_color)),
        Span::raw(format!(" {status_text}")),
        Span::raw(format!(" | {} tasks", app.engine.tasks().len())),
    ];
    if app.engine.phase() == DragPhase::Resolving {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled("saving…", theme::normal().fg(theme::WARNING)));
    }
    spans.push(Span::raw(" | "));
    spans.push(Span::styled(help_text, theme::dimmed()));

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
