//! Board state projection.
//!
//! A pure derivation from the flat task list to per-column sequences.
//! Nothing here mutates state; the projector is re-run whenever the
//! underlying list or the column filter changes.

use taskdeck_proto::task::{Task, TaskId, TaskStatus};

/// One board lane: a status and the tasks projected into it.
#[derive(Debug)]
pub struct ColumnView<'a> {
    /// The status this lane renders.
    pub status: TaskStatus,
    /// Tasks in display order.
    pub tasks: Vec<&'a Task>,
}

/// Sort key for intra-column ordering.
///
/// Tasks without an explicit position sort after positioned ones; the
/// stable sort keeps their relative input order.
fn position_key(task: &Task) -> u32 {
    task.position.unwrap_or(u32::MAX)
}

/// Projects the flat task list into board columns.
///
/// Each column holds exactly the tasks whose `status` matches, sorted
/// by stored position ascending. When `filter` is given, only the
/// listed statuses produce columns, always in the board's fixed
/// column order.
#[must_use]
pub fn project<'a>(tasks: &'a [Task], filter: Option<&[TaskStatus]>) -> Vec<ColumnView<'a>> {
    TaskStatus::ALL
        .iter()
        .copied()
        .filter(|status| filter.is_none_or(|f| f.contains(status)))
        .map(|status| {
            let mut column: Vec<&Task> = tasks.iter().filter(|t| t.status == status).collect();
            column.sort_by_key(|t| position_key(t));
            ColumnView {
                status,
                tasks: column,
            }
        })
        .collect()
}

/// Returns one column's task ids in projected display order.
#[must_use]
pub fn column_order(tasks: &[Task], status: TaskStatus) -> Vec<TaskId> {
    let mut column: Vec<&Task> = tasks.iter().filter(|t| t.status == status).collect();
    column.sort_by_key(|t| position_key(t));
    column.iter().map(|t| t.id).collect()
}
