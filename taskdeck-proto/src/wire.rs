//! Hub wire protocol for `TaskDeck`.
//!
//! Defines the [`HubMessage`] enum that is postcard-encoded and sent
//! over WebSocket binary frames between board clients and the hub.
//! Writes carry a client-chosen `request_id` so acknowledgements can be
//! correlated; [`HubMessage::Changed`] is an unsolicited push telling
//! subscribed clients the task set may have changed.

use serde::{Deserialize, Serialize};

use crate::task::{PositionUpdate, Task, TaskId, TaskStatus};

/// Error type for wire encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Serialization or deserialization failed.
    #[error("wire codec error: {0}")]
    Codec(String),
}

/// Messages exchanged between board clients and the hub.
///
/// The protocol is session-oriented: a client identifies itself with
/// [`HubMessage::Hello`] as its first frame, the hub confirms with
/// [`HubMessage::Welcome`], and afterwards requests and pushes flow
/// freely in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HubMessage {
    /// Client identifies the board user for this session.
    ///
    /// Must be the first message sent after the WebSocket connection.
    /// The hub responds with [`HubMessage::Welcome`] on success.
    Hello {
        /// The user this session acts for. Positions are resolved per user.
        user: String,
    },

    /// Hub acknowledges a successful session handshake.
    Welcome {
        /// The user that was registered (echoed back for confirmation).
        user: String,
    },

    /// Client asks for every task visible to the session user.
    FetchTasks,

    /// Hub answers a fetch with the user's view of the board.
    ///
    /// Each task carries the session user's position for its lane, or
    /// `None` if that user never ordered it.
    TaskList {
        /// All visible tasks.
        tasks: Vec<Task>,
    },

    /// Client moves one task to a new status lane.
    UpdateStatus {
        /// Correlation id echoed back in the acknowledgement.
        request_id: u64,
        /// The task to move.
        task: TaskId,
        /// The lane it moves to.
        status: TaskStatus,
    },

    /// Client rewrites the session user's positions for one lane.
    ///
    /// Sent as one batch so a reorder is acknowledged or refused as a
    /// whole, never partially.
    UpdatePositions {
        /// Correlation id echoed back in the acknowledgement.
        request_id: u64,
        /// New (task, position) pairs for the reordered lane.
        updates: Vec<PositionUpdate>,
    },

    /// Hub confirms that a write was applied.
    Ack {
        /// The `request_id` of the write being confirmed.
        request_id: u64,
    },

    /// Hub rejects a write.
    Refused {
        /// The `request_id` of the write being rejected.
        request_id: u64,
        /// Human-readable rejection reason.
        reason: String,
    },

    /// Hub notifies the client that the task set may have changed.
    ///
    /// Carries no payload: the client is expected to silently refetch.
    Changed,
}

/// Encodes a [`HubMessage`] into bytes using postcard.
///
/// # Errors
///
/// Returns [`WireError::Codec`] if serialization fails.
pub fn encode(msg: &HubMessage) -> Result<Vec<u8>, WireError> {
    postcard::to_allocvec(msg).map_err(|e| WireError::Codec(e.to_string()))
}

/// Decodes a [`HubMessage`] from bytes using postcard.
///
/// # Errors
///
/// Returns [`WireError::Codec`] if deserialization fails.
pub fn decode(bytes: &[u8]) -> Result<HubMessage, WireError> {
    postcard::from_bytes(bytes).map_err(|e| WireError::Codec(e.to_string()))
}
