//! Drag session vocabulary.

use taskdeck_proto::task::{TaskId, TaskStatus};

/// What the pointer is over, as resolved by collision testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Another task card.
    Card(TaskId),
    /// A column background.
    Column(TaskStatus),
}

/// Where a drag began.
///
/// Captured once at drag start from the list as rendered at that
/// moment and never recomputed, so drop classification always compares
/// against the same value no matter what optimistic moves happened
/// while the drag was in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragOrigin {
    /// The task being dragged.
    pub task: TaskId,
    /// The column the task occupied at drag start.
    pub status: TaskStatus,
}

/// Externally observable drag lifecycle phase.
///
/// These phases are the only mutual exclusion around drag operations:
/// a new drag can begin whenever no gesture is active, including while
/// an earlier mutation is still waiting on the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    /// No gesture active, nothing awaiting persistence.
    Idle,
    /// A card is being dragged.
    Dragging,
    /// The gesture ended and at least one mutation awaits its verdict.
    Resolving,
}
