//! The optimistic board engine.
//!
//! One drag gesture at a time, immediate local mutation, one
//! persistence attempt per gesture, and deferred reconciliation with
//! authoritative refreshes. The engine is synchronous and owns no I/O:
//! it hands persistence work to the caller as [`StoreCommand`] values
//! and hears back through [`BoardEngine::store_settled`], so every
//! path through it can be driven from a plain unit test.

use std::collections::VecDeque;

use taskdeck_proto::task::{PositionUpdate, Task, TaskId, TaskStatus};

use super::drag::{DragOrigin, DragPhase, DropTarget};
use super::project::{self, ColumnView};
use super::order;

/// Persistence work the engine wants performed.
///
/// The caller runs the matching store operation and echoes the request
/// id back through [`BoardEngine::store_settled`] with the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    /// Persist a single task's status change.
    UpdateStatus {
        /// Settlement correlation id.
        request_id: u64,
        /// The task to update.
        task: TaskId,
        /// The status to persist.
        status: TaskStatus,
    },
    /// Persist one column's renumbered positions as a single batch.
    UpdatePositions {
        /// Settlement correlation id.
        request_id: u64,
        /// The full batch for the reordered column, in display order.
        updates: Vec<PositionUpdate>,
    },
}

impl StoreCommand {
    /// The id the settlement must carry.
    #[must_use]
    pub fn request_id(&self) -> u64 {
        match self {
            Self::UpdateStatus { request_id, .. } | Self::UpdatePositions { request_id, .. } => {
                *request_id
            }
        }
    }
}

/// User-visible outcome of a settled mutation, surfaced as a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// A reorder batch was accepted.
    OrderSaved,
    /// A status change was accepted.
    StatusSaved,
    /// A reorder batch was refused; the board was restored.
    OrderFailed,
    /// A status change was refused; the task's status was reverted.
    StatusFailed,
}

impl Notice {
    /// The toast text for this outcome.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::OrderSaved => "Task order updated",
            Self::StatusSaved => "Task status updated",
            Self::OrderFailed => "Failed to reorder tasks",
            Self::StatusFailed => "Failed to update task status",
        }
    }

    /// Whether this outcome reports a failure.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::OrderFailed | Self::StatusFailed)
    }
}

/// A mutation issued to the store and not yet settled, carrying the
/// data needed to undo its local effect if the store refuses it.
#[derive(Debug, Clone)]
enum InflightOp {
    Status {
        request_id: u64,
        task: TaskId,
        prior: TaskStatus,
        target: TaskStatus,
    },
    Order {
        request_id: u64,
        /// Task list exactly as rendered before the drag started.
        snapshot: Vec<Task>,
        updates: Vec<PositionUpdate>,
    },
}

impl InflightOp {
    fn request_id(&self) -> u64 {
        match self {
            Self::Status { request_id, .. } | Self::Order { request_id, .. } => *request_id,
        }
    }
}

/// Bookkeeping for the active gesture.
#[derive(Debug)]
struct ActiveDrag {
    origin: DragOrigin,
    /// Pre-drag task list, kept for a potential full revert.
    snapshot: Vec<Task>,
}

/// Client-local board state and the drag/persistence state machine.
///
/// The engine mutates its task list from three sources: cross-column
/// hover moves, drop-time reorders, and authoritative refreshes. The
/// caller drives all three from one thread, so consistency rests on
/// two rules rather than locks: refreshes arriving mid-drag are
/// buffered until the gesture ends, and every unsettled mutation keeps
/// enough state to be undone or replayed.
#[derive(Debug, Default)]
pub struct BoardEngine {
    tasks: Vec<Task>,
    filter: Option<Vec<TaskStatus>>,
    drag: Option<ActiveDrag>,
    inflight: VecDeque<InflightOp>,
    pending_refresh: Option<Vec<Task>>,
    next_request_id: u64,
}

impl BoardEngine {
    /// Creates an engine with an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine around an initial task list.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            ..Self::default()
        }
    }

    /// The task list as currently rendered.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Columns in display form, honoring the active filter.
    #[must_use]
    pub fn columns(&self) -> Vec<ColumnView<'_>> {
        project::project(&self.tasks, self.filter.as_deref())
    }

    /// Restricts the board to a subset of columns, or shows all.
    pub fn set_filter(&mut self, filter: Option<Vec<TaskStatus>>) {
        self.filter = filter;
    }

    /// The active column filter, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&[TaskStatus]> {
        self.filter.as_deref()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> DragPhase {
        if self.drag.is_some() {
            DragPhase::Dragging
        } else if self.inflight.is_empty() {
            DragPhase::Idle
        } else {
            DragPhase::Resolving
        }
    }

    /// The task under the pointer, if a drag is active.
    #[must_use]
    pub fn dragged_task(&self) -> Option<TaskId> {
        self.drag.as_ref().map(|d| d.origin.task)
    }

    /// Begins a drag on `task`.
    ///
    /// Captures the origin from the list as currently rendered and
    /// snapshots the whole list for a potential revert. Ignored when a
    /// gesture is already active or the task is unknown.
    pub fn drag_start(&mut self, task: TaskId) {
        if self.drag.is_some() {
            return;
        }
        let Some(status) = self.status_of(task) else {
            return;
        };
        self.drag = Some(ActiveDrag {
            origin: DragOrigin { task, status },
            snapshot: self.tasks.clone(),
        });
    }

    /// Updates the hover target mid-drag.
    ///
    /// When the resolved target sits in a different column than the
    /// dragged card currently occupies, the card moves there right
    /// away. Repeated events over the same column change nothing.
    pub fn drag_over(&mut self, target: DropTarget) {
        let Some(drag) = &self.drag else { return };
        let dragged = drag.origin.task;
        let Some(target_status) = self.target_status(target) else {
            return;
        };
        if self.status_of(dragged).is_some_and(|s| s != target_status) {
            self.set_local_status(dragged, target_status);
        }
    }

    /// Ends the drag and classifies the drop.
    ///
    /// Returns the persistence command the caller should run, if the
    /// drop amounts to one. A refresh buffered during the gesture is
    /// installed once the session is over, whatever the outcome.
    pub fn drag_end(&mut self, target: Option<DropTarget>) -> Option<StoreCommand> {
        let Some(drag) = self.drag.take() else {
            return None;
        };
        let command = self.classify_drop(&drag, target);
        if let Some(tasks) = self.pending_refresh.take() {
            self.install_refresh(tasks);
        }
        command
    }

    /// Accepts a fresh authoritative task list.
    ///
    /// While a gesture is active the list is held back so the rendered
    /// board stays stable under the pointer; the newest list wins and
    /// is installed exactly once when the session ends. Otherwise it is
    /// installed immediately, with the effects of still unsettled
    /// mutations reapplied on top.
    pub fn refresh(&mut self, tasks: Vec<Task>) {
        if self.drag.is_some() {
            self.pending_refresh = Some(tasks);
        } else {
            self.install_refresh(tasks);
        }
    }

    /// Records the store's verdict for a previously issued command.
    ///
    /// On refusal the op's local effect is undone: a failed reorder
    /// restores the full pre-drag list, a failed status change reverts
    /// only that task's status. Returns the toast to show, or `None`
    /// for an id the engine is not waiting on.
    pub fn store_settled(&mut self, request_id: u64, result: Result<(), String>) -> Option<Notice> {
        let index = self
            .inflight
            .iter()
            .position(|op| op.request_id() == request_id)?;
        let op = self.inflight.remove(index)?;
        match (op, result) {
            (InflightOp::Order { .. }, Ok(())) => Some(Notice::OrderSaved),
            (InflightOp::Status { .. }, Ok(())) => Some(Notice::StatusSaved),
            (InflightOp::Order { snapshot, .. }, Err(reason)) => {
                tracing::warn!(error = %reason, "reorder refused, restoring pre-drag board");
                self.tasks = snapshot;
                Some(Notice::OrderFailed)
            }
            (InflightOp::Status { task, prior, .. }, Err(reason)) => {
                tracing::warn!(task = %task, error = %reason, "status update refused, reverting");
                self.set_local_status(task, prior);
                Some(Notice::StatusFailed)
            }
        }
    }

    fn classify_drop(&mut self, drag: &ActiveDrag, target: Option<DropTarget>) -> Option<StoreCommand> {
        let origin = drag.origin;
        let Some(target) = target else {
            // Cancelled: undo the optimistic hover move, if any.
            self.set_local_status(origin.task, origin.status);
            return None;
        };
        let Some(target_status) = self.target_status(target) else {
            // The target vanished from local state; same as a cancel.
            self.set_local_status(origin.task, origin.status);
            return None;
        };
        if self.status_of(origin.task).is_none() {
            return None;
        }

        // A drop implies a final hover over the target.
        self.set_local_status(origin.task, target_status);

        if target_status == origin.status {
            // Same column: only landing on another card can reorder.
            let DropTarget::Card(over) = target else {
                return None;
            };
            let column = project::column_order(&self.tasks, origin.status);
            let updates = order::reorder_onto(&column, origin.task, over)?;
            self.apply_positions(&updates);
            let request_id = self.issue_request_id();
            self.inflight.push_back(InflightOp::Order {
                request_id,
                snapshot: drag.snapshot.clone(),
                updates: updates.clone(),
            });
            return Some(StoreCommand::UpdatePositions {
                request_id,
                updates,
            });
        }

        // Cross column: the move is already visible, persist the status.
        let request_id = self.issue_request_id();
        self.inflight.push_back(InflightOp::Status {
            request_id,
            task: origin.task,
            prior: origin.status,
            target: target_status,
        });
        Some(StoreCommand::UpdateStatus {
            request_id,
            task: origin.task,
            status: target_status,
        })
    }

    /// Installs a refreshed list, replaying unsettled local effects on
    /// top so an in-flight mutation is not visually undone by a stale
    /// snapshot.
    fn install_refresh(&mut self, mut tasks: Vec<Task>) {
        for op in &self.inflight {
            match op {
                InflightOp::Status { task, target, .. } => {
                    if let Some(t) = tasks.iter_mut().find(|t| t.id == *task) {
                        t.status = *target;
                    }
                }
                InflightOp::Order { updates, .. } => {
                    for update in updates {
                        if let Some(t) = tasks.iter_mut().find(|t| t.id == update.task) {
                            t.position = Some(update.position);
                        }
                    }
                }
            }
        }
        self.tasks = tasks;
    }

    fn apply_positions(&mut self, updates: &[PositionUpdate]) {
        for update in updates {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == update.task) {
                task.position = Some(update.position);
            }
        }
    }

    fn status_of(&self, task: TaskId) -> Option<TaskStatus> {
        self.tasks.iter().find(|t| t.id == task).map(|t| t.status)
    }

    fn target_status(&self, target: DropTarget) -> Option<TaskStatus> {
        match target {
            DropTarget::Card(id) => self.status_of(id),
            DropTarget::Column(status) => Some(status),
        }
    }

    fn set_local_status(&mut self, task: TaskId, status: TaskStatus) {
        if let Some(t) = self.tasks.iter_mut().find(|t| t.id == task) {
            t.status = status;
        }
    }

    fn issue_request_id(&mut self) -> u64 {
        self.next_request_id += 1;
        self.next_request_id
    }
}
