//! `TaskDeck` hub server library.
//!
//! Exposes the board sync hub for use in tests and embedding.
//! The hub accepts WebSocket connections, keeps the shared task table
//! with per-user lane positions, and fans change notifications out to
//! every other connected board.

pub mod board;
pub mod config;
pub mod hub;
