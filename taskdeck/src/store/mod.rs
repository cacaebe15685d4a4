//! Task store abstraction for `TaskDeck`.
//!
//! Defines the [`TaskStore`] trait the board engine's persistence goes
//! through. Concrete implementations:
//! - [`memory::MemoryStore`] — in-process store for offline and demo use
//! - [`remote::RemoteStore`] — WebSocket client for a shared hub

pub mod memory;
pub mod remote;

pub use memory::MemoryStore;
pub use remote::RemoteStore;

use std::fmt;

use taskdeck_proto::task::{PositionUpdate, Task, TaskId, TaskStatus};
use taskdeck_proto::wire::WireError;

/// Describes which kind of store is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// In-process store, nothing leaves the machine.
    Memory,
    /// Shared board served by a hub.
    Hub,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "local"),
            Self::Hub => write!(f, "hub"),
        }
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The connection to the hub has been closed.
    #[error("store connection closed")]
    ConnectionClosed,

    /// The operation timed out before completing.
    #[error("store operation timed out")]
    Timeout,

    /// The store looked at the update and said no.
    #[error("update refused: {0}")]
    Refused(String),

    /// The hub address cannot be resolved or connected.
    #[error("hub {0} is unreachable")]
    Unreachable(String),

    /// A message failed to encode or decode.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// An underlying I/O error occurred.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A seed file could not be parsed.
    #[error("invalid seed file: {0}")]
    Seed(String),
}

/// Async store trait covering everything the board persists or loads.
///
/// Writes return once the store has accepted or refused the mutation;
/// they make one attempt and never retry. Reads return the full task
/// list visible to the current user.
pub trait TaskStore: Send + Sync {
    /// Persist a single task's status change.
    fn update_status(
        &self,
        task: TaskId,
        status: TaskStatus,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Persist a column's renumbered positions as one atomic batch.
    fn batch_update_positions(
        &self,
        updates: Vec<PositionUpdate>,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Fetch the full task list visible to the current user.
    fn visible_tasks(&self) -> impl std::future::Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Subscribe to change notifications.
    ///
    /// A received `()` means the authoritative list may have changed
    /// and should be refetched; dropping the receiver unsubscribes.
    fn subscribe_changes(&self) -> tokio::sync::broadcast::Receiver<()>;

    /// Whether the store can currently accept operations.
    fn is_connected(&self) -> bool;

    /// Return the kind of this store.
    fn kind(&self) -> StoreKind;
}
