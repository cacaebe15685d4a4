//! Transient toast overlay, drawn over the board's top-right corner.

use ratatui::{
    Frame,
    layout::Rect,
    widgets::{Clear, Paragraph},
};

use super::theme;
use crate::app::App;

/// Render the most recent active toast, if any.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(toast) = app.toasts.last() else {
        return;
    };

    let text = format!(" {} ", toast.text);
    let width = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
    let width = width.min(area.width);
    if width == 0 || area.height == 0 {
        return;
    }
    let overlay = Rect {
        x: area.x + area.width - width,
        y: area.y,
        width,
        height: 1,
    };

    let style = if toast.failure {
        theme::toast_error()
    } else {
        theme::toast_ok()
    };
    frame.render_widget(Clear, overlay);
    frame.render_widget(Paragraph::new(text).style(style), overlay);
}
