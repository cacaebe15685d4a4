//! Shared task model and wire protocol definitions for `TaskDeck`.

pub mod task;
pub mod wire;
