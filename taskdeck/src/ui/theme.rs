//! Theme and styling constants for the TUI.

use ratatui::style::{Color, Modifier, Style};
use taskdeck_proto::task::{TaskPriority, TaskStatus};

/// Primary foreground color.
pub const FG_PRIMARY: Color = Color::White;

/// Secondary foreground color (dimmed text).
pub const FG_SECONDARY: Color = Color::Gray;

/// Highlight color for focused elements.
pub const HIGHLIGHT: Color = Color::Cyan;

/// Success/online indicator color.
pub const SUCCESS: Color = Color::Green;

/// Warning indicator color.
pub const WARNING: Color = Color::Yellow;

/// Error/offline indicator color.
pub const ERROR: Color = Color::Red;

/// Offline indicator color.
pub const OFFLINE: Color = Color::DarkGray;

/// Accent color for each board lane.
#[must_use]
pub const fn lane_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Backlog => Color::Blue,
        TaskStatus::InProgress => Color::Cyan,
        TaskStatus::WaitingReview => Color::Yellow,
        TaskStatus::SentClient => Color::Magenta,
        TaskStatus::Feedback => Color::LightRed,
        TaskStatus::Approved => Color::Green,
        TaskStatus::Done => Color::DarkGray,
    }
}

/// Marker color for a task's priority.
#[must_use]
pub const fn priority_color(priority: TaskPriority) -> Color {
    match priority {
        TaskPriority::Low => Color::DarkGray,
        TaskPriority::Medium => Color::Gray,
        TaskPriority::High => Color::Yellow,
        TaskPriority::Urgent => Color::Red,
    }
}

/// Normal text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style (due dates, metadata).
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Highlighted style (active drop target borders).
#[must_use]
pub fn highlighted() -> Style {
    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

/// Style for the card being dragged, left behind in its lane.
#[must_use]
pub fn lifted() -> Style {
    Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::DIM)
}

/// Style for the floating drag ghost.
#[must_use]
pub fn ghost() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Rgb(180, 180, 200))
        .add_modifier(Modifier::BOLD)
}

/// Style for the status bar background (dark background with white foreground).
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 50))
}

/// Style for lane titles with the lane's accent color (bold).
#[must_use]
pub fn lane_title(status: TaskStatus) -> Style {
    Style::default()
        .fg(lane_color(status))
        .add_modifier(Modifier::BOLD)
}

/// Style for card count badges in lane headers.
#[must_use]
pub fn count_badge() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

/// Style for a confirmation toast.
#[must_use]
pub fn toast_ok() -> Style {
    Style::default().fg(Color::Black).bg(SUCCESS)
}

/// Style for a failure toast.
#[must_use]
pub fn toast_error() -> Style {
    Style::default()
        .fg(Color::White)
        .bg(ERROR)
        .add_modifier(Modifier::BOLD)
}
