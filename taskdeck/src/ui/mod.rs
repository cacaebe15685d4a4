//! Terminal UI rendering.

pub mod board;
pub mod status_bar;
pub mod theme;
pub mod toast;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::app::App;

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    // Board above, one-line status bar below.
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let board_area = main_chunks[0];
    let status_area = main_chunks[1];

    board::render(frame, board_area, app);
    status_bar::render(frame, status_area, app);

    // Toasts float over the board.
    toast::render(frame, board_area, app);
}
