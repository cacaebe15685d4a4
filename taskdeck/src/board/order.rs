//! Position arithmetic for intra-column reordering.
//!
//! Slots are spaced 100 apart so a future manual insertion can take an
//! intermediate value without renumbering the whole column.

use taskdeck_proto::task::{PositionUpdate, TaskId};

/// Spacing between consecutive slot positions.
pub const POSITION_STEP: u32 = 100;

/// Position assigned to the slot at `index` (0-based): slot 0 is 100.
#[must_use]
pub fn slot_position(index: usize) -> u32 {
    u32::try_from(index + 1)
        .unwrap_or(u32::MAX)
        .saturating_mul(POSITION_STEP)
}

/// Moves one element from `from` to `to` with list-move semantics: the
/// element is removed and reinserted, shifting everything in between.
/// Out-of-range indices leave the order unchanged.
#[must_use]
pub fn move_index(order: &[TaskId], from: usize, to: usize) -> Vec<TaskId> {
    let mut next = order.to_vec();
    if from >= next.len() || to >= next.len() {
        return next;
    }
    let task = next.remove(from);
    next.insert(to, task);
    next
}

/// Renumbers a column order into a persistable position batch.
#[must_use]
pub fn renumber(order: &[TaskId]) -> Vec<PositionUpdate> {
    order
        .iter()
        .enumerate()
        .map(|(index, &task)| PositionUpdate {
            task,
            position: slot_position(index),
        })
        .collect()
}

/// Computes the position batch for dropping `dragged` onto `target`
/// within one column's current display order.
///
/// Returns `None` when either id is missing from the order or the move
/// would not change any index.
#[must_use]
pub fn reorder_onto(
    order: &[TaskId],
    dragged: TaskId,
    target: TaskId,
) -> Option<Vec<PositionUpdate>> {
    let from = order.iter().position(|&t| t == dragged)?;
    let to = order.iter().position(|&t| t == target)?;
    if from == to {
        return None;
    }
    Some(renumber(&move_index(order, from, to)))
}
