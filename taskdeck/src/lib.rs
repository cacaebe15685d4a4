//! `TaskDeck` — terminal-native team Kanban board library.

pub mod app;
pub mod board;
pub mod config;
pub mod store;
pub mod sync;
pub mod ui;
