//! Integration tests for the full drag-and-drop board flow.
//!
//! Drives the board engine through complete user sessions: loading a
//! board, reordering within a lane, moving cards across lanes, store
//! refusals, and authoritative refreshes arriving at awkward times.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::similar_names)]

use taskdeck::board::{BoardEngine, DragPhase, DropTarget, Notice, StoreCommand};
use taskdeck_proto::task::{Task, TaskId, TaskKind, TaskPriority, TaskStatus};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn make_task(title: &str, status: TaskStatus, position: Option<u32>) -> Task {
    Task {
        id: TaskId::new(),
        title: title.to_string(),
        description: String::new(),
        status,
        priority: TaskPriority::Medium,
        kind: TaskKind::Feature,
        project: None,
        assignees: vec![],
        reviewers: vec![],
        due_ms: None,
        position,
        created_ms: 0,
    }
}

/// backlog = [a(100), b(200), c(300)], `in_progress` = [d(100)].
fn seeded_engine() -> (BoardEngine, TaskId, TaskId, TaskId, TaskId) {
    let a = make_task("a", TaskStatus::Backlog, Some(100));
    let b = make_task("b", TaskStatus::Backlog, Some(200));
    let c = make_task("c", TaskStatus::Backlog, Some(300));
    let d = make_task("d", TaskStatus::InProgress, Some(100));
    let (ida, idb, idc, idd) = (a.id, b.id, c.id, d.id);
    (BoardEngine::with_tasks(vec![a, b, c, d]), ida, idb, idc, idd)
}

/// Ids of one lane in display order.
fn lane(engine: &BoardEngine, status: TaskStatus) -> Vec<TaskId> {
    engine
        .columns()
        .iter()
        .find(|c| c.status == status)
        .map(|c| c.tasks.iter().map(|t| t.id).collect())
        .unwrap_or_default()
}

fn status_of(engine: &BoardEngine, id: TaskId) -> TaskStatus {
    engine
        .tasks()
        .iter()
        .find(|t| t.id == id)
        .expect("task present")
        .status
}

// ===========================================================================
// A full working session
// ===========================================================================

#[test]
fn full_session_from_load_to_settled_mutations() {
    let (seeded, a, b, c, d) = seeded_engine();
    let mut engine = BoardEngine::new();
    engine.refresh(seeded.tasks().to_vec());
    assert_eq!(lane(&engine, TaskStatus::Backlog), vec![a, b, c]);

    // Reorder: c jumps to the top of backlog.
    engine.drag_start(c);
    engine.drag_over(DropTarget::Card(a));
    let command = engine.drag_end(Some(DropTarget::Card(a))).expect("reorder");
    let StoreCommand::UpdatePositions { ref updates, .. } = command else {
        panic!("expected a position batch, got {command:?}");
    };
    assert_eq!(updates.len(), 3, "whole lane is renumbered");
    assert_eq!(lane(&engine, TaskStatus::Backlog), vec![c, a, b]);

    assert_eq!(
        engine.store_settled(command.request_id(), Ok(())),
        Some(Notice::OrderSaved)
    );

    // Cross-lane move: b lands on the in-progress background.
    engine.drag_start(b);
    engine.drag_over(DropTarget::Column(TaskStatus::InProgress));
    assert_eq!(
        status_of(&engine, b),
        TaskStatus::InProgress,
        "hover moves the card before the drop"
    );
    let command = engine
        .drag_end(Some(DropTarget::Column(TaskStatus::InProgress)))
        .expect("status change");
    assert!(matches!(command, StoreCommand::UpdateStatus { .. }));
    assert_eq!(
        engine.store_settled(command.request_id(), Ok(())),
        Some(Notice::StatusSaved)
    );

    // Cross-lane drop onto a card: same status change semantics.
    engine.drag_start(a);
    let command = engine
        .drag_end(Some(DropTarget::Card(d)))
        .expect("status change");
    let StoreCommand::UpdateStatus { task, status, .. } = command else {
        panic!("expected a status update");
    };
    assert_eq!(task, a);
    assert_eq!(status, TaskStatus::InProgress);

    // The store refuses: only a snaps back.
    assert_eq!(
        engine.store_settled(command.request_id(), Err("boom".into())),
        Some(Notice::StatusFailed)
    );
    assert_eq!(status_of(&engine, a), TaskStatus::Backlog);
    assert_eq!(lane(&engine, TaskStatus::InProgress), vec![d, b]);
    assert_eq!(engine.phase(), DragPhase::Idle);
}

// ===========================================================================
// Projection rules
// ===========================================================================

#[test]
fn lane_order_follows_positions_then_insertion() {
    let positioned_late = make_task("late", TaskStatus::Backlog, Some(50));
    let unpositioned_first = make_task("first", TaskStatus::Backlog, None);
    let unpositioned_second = make_task("second", TaskStatus::Backlog, None);
    let ids = (
        positioned_late.id,
        unpositioned_first.id,
        unpositioned_second.id,
    );
    let engine = BoardEngine::with_tasks(vec![
        unpositioned_first,
        positioned_late,
        unpositioned_second,
    ]);

    // Positioned card first, then the unpositioned ones in insertion order.
    assert_eq!(
        lane(&engine, TaskStatus::Backlog),
        vec![ids.0, ids.1, ids.2]
    );
}

#[test]
fn filter_restricts_lanes_in_board_order() {
    let (mut engine, ..) = seeded_engine();
    engine.set_filter(Some(vec![TaskStatus::Done, TaskStatus::Backlog]));

    let columns = engine.columns();
    let statuses: Vec<TaskStatus> = columns.iter().map(|c| c.status).collect();
    // Filter picks lanes; the board's fixed order decides their sequence.
    assert_eq!(statuses, vec![TaskStatus::Backlog, TaskStatus::Done]);

    engine.set_filter(None);
    assert_eq!(engine.columns().len(), TaskStatus::ALL.len());
}

#[test]
fn reorder_batch_renumbers_in_hundreds() {
    let (mut engine, a, _, c, _) = seeded_engine();

    engine.drag_start(a);
    let command = engine.drag_end(Some(DropTarget::Card(c))).expect("reorder");
    let StoreCommand::UpdatePositions { updates, .. } = command else {
        panic!("expected a position batch");
    };

    let positions: Vec<u32> = updates.iter().map(|u| u.position).collect();
    assert_eq!(positions, vec![100, 200, 300]);
}

// ===========================================================================
// Refresh reconciliation
// ===========================================================================

#[test]
fn refresh_while_idle_replaces_the_board() {
    let (mut engine, ..) = seeded_engine();
    let replacement = vec![make_task("only", TaskStatus::Done, Some(100))];
    let only = replacement[0].id;

    engine.refresh(replacement);

    assert_eq!(engine.tasks().len(), 1);
    assert_eq!(lane(&engine, TaskStatus::Done), vec![only]);
}

#[test]
fn refresh_mid_drag_lands_after_the_drop_with_local_move_kept() {
    let (mut engine, a, b, c, d) = seeded_engine();

    engine.drag_start(a);
    engine.drag_over(DropTarget::Column(TaskStatus::Done));

    // A teammate added a task; the server list still shows a in backlog.
    let mut server_list: Vec<Task> = engine
        .tasks()
        .iter()
        .cloned()
        .map(|mut t| {
            if t.id == a {
                t.status = TaskStatus::Backlog;
            }
            t
        })
        .collect();
    let e = make_task("e", TaskStatus::Backlog, Some(400));
    let ide = e.id;
    server_list.push(e);
    engine.refresh(server_list);

    // Buffered: the rendered board has not changed yet.
    assert!(!lane(&engine, TaskStatus::Backlog).contains(&ide));

    let command = engine
        .drag_end(Some(DropTarget::Column(TaskStatus::Done)))
        .expect("status change");

    // Installed exactly once, with the unsettled move replayed on top.
    assert!(lane(&engine, TaskStatus::Backlog).contains(&ide));
    assert_eq!(status_of(&engine, a), TaskStatus::Done);
    assert_eq!(lane(&engine, TaskStatus::Backlog), vec![b, c, ide]);

    assert_eq!(
        engine.store_settled(command.request_id(), Ok(())),
        Some(Notice::StatusSaved)
    );
    assert_eq!(status_of(&engine, d), TaskStatus::InProgress);
}

#[test]
fn newest_refresh_wins_when_several_arrive_mid_drag() {
    let (mut engine, a, ..) = seeded_engine();

    engine.drag_start(a);
    engine.refresh(vec![make_task("stale", TaskStatus::Backlog, Some(100))]);
    let newest = vec![make_task("fresh", TaskStatus::Backlog, Some(100))];
    let fresh = newest[0].id;
    engine.refresh(newest);

    engine.drag_end(None);

    assert_eq!(engine.tasks().len(), 1);
    assert_eq!(engine.tasks()[0].id, fresh);
}

// ===========================================================================
// Cancels and degenerate drops
// ===========================================================================

#[test]
fn cancelled_drag_after_cross_lane_hover_restores_origin() {
    let (mut engine, a, ..) = seeded_engine();
    let before = engine.tasks().to_vec();

    engine.drag_start(a);
    engine.drag_over(DropTarget::Column(TaskStatus::Done));
    assert_eq!(status_of(&engine, a), TaskStatus::Done);

    assert!(engine.drag_end(None).is_none());
    assert_eq!(engine.tasks(), before.as_slice());
    assert_eq!(engine.phase(), DragPhase::Idle);
}

#[test]
fn same_lane_background_drop_changes_nothing() {
    let (mut engine, a, ..) = seeded_engine();
    let before = engine.tasks().to_vec();

    engine.drag_start(a);
    let command = engine.drag_end(Some(DropTarget::Column(TaskStatus::Backlog)));

    assert!(command.is_none());
    assert_eq!(engine.tasks(), before.as_slice());
}
