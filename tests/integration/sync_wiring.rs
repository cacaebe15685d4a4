//! Tests the whole client loop short of the terminal: app state, sync
//! channels, and an in-process store.
//!
//! Events flow exactly as in `main`: the app folds in [`SyncEvent`]s,
//! key handling produces [`SyncCommand`]s, and the sync layer runs them
//! against the store in the background.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::similar_names)]

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tokio::time::timeout;

use taskdeck::app::App;
use taskdeck::store::TaskStore;
use taskdeck::store::memory::MemoryStore;
use taskdeck::sync::{SyncEvent, spawn_sync};
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

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

/// Feeds sync events into the app until `done` is satisfied.
async fn pump_until(
    app: &mut App,
    evt_rx: &mut mpsc::Receiver<SyncEvent>,
    mut done: impl FnMut(&App) -> bool,
) {
    while !done(app) {
        let event = timeout(Duration::from_secs(2), evt_rx.recv())
            .await
            .expect("an event should arrive")
            .expect("event channel should stay open");
        app.handle_sync_event(event);
    }
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn startup_events_populate_the_board() {
    let store = Arc::new(MemoryStore::with_tasks(vec![
        make_task("a", TaskStatus::Backlog, Some(100)),
        make_task("b", TaskStatus::InProgress, Some(100)),
    ]));
    let (_cmd_tx, mut evt_rx) = spawn_sync(store).await;

    let mut app = App::new();
    pump_until(&mut app, &mut evt_rx, |a| a.engine.tasks().len() == 2).await;

    assert!(app.is_connected);
    assert_eq!(app.store_label, "local");
    assert!(app.toasts.is_empty(), "a clean startup needs no toasts");
}

// ---------------------------------------------------------------------------
// Gestures through the loop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn keyboard_reorder_persists_and_toasts() {
    let a = make_task("a", TaskStatus::Backlog, Some(100));
    let b = make_task("b", TaskStatus::Backlog, Some(200));
    let (ida, idb) = (a.id, b.id);
    let store = Arc::new(MemoryStore::with_tasks(vec![a, b]));
    let (cmd_tx, mut evt_rx) = spawn_sync(Arc::clone(&store)).await;

    let mut app = App::new();
    pump_until(&mut app, &mut evt_rx, |a| a.engine.tasks().len() == 2).await;

    // Lift a, aim one row down, drop onto b.
    assert!(app.handle_key_event(key(KeyCode::Char(' '))).is_none());
    assert!(app.handle_key_event(key(KeyCode::Down)).is_none());
    let command = app
        .handle_key_event(key(KeyCode::Char(' ')))
        .expect("the drop should issue store work");
    cmd_tx.send(command).await.expect("sync should accept the command");

    pump_until(&mut app, &mut evt_rx, |a| !a.toasts.is_empty()).await;
    assert_eq!(app.toasts[0].text, "Task order updated");
    assert!(!app.toasts[0].failure);

    // The store now holds the renumbered column.
    let stored = store.visible_tasks().await.expect("fetch succeeds");
    let position_of = |id: TaskId| {
        stored
            .iter()
            .find(|t| t.id == id)
            .expect("task present")
            .position
    };
    assert_eq!(position_of(idb), Some(100));
    assert_eq!(position_of(ida), Some(200));
}

#[tokio::test]
async fn refused_write_reverts_the_app_board() {
    // The store is empty: every write the app attempts will be refused.
    let store = Arc::new(MemoryStore::new());
    let (cmd_tx, mut evt_rx) = spawn_sync(store).await;

    let mut app = App::new();
    // Consume the startup burst (connection status + empty initial load).
    for _ in 0..2 {
        let event = timeout(Duration::from_secs(2), evt_rx.recv())
            .await
            .expect("a startup event should arrive")
            .expect("event channel should stay open");
        app.handle_sync_event(event);
    }

    // A list fetched before the hub lost its state.
    let task = make_task("a", TaskStatus::Backlog, Some(100));
    app.handle_sync_event(SyncEvent::Tasks(vec![task]));

    // Lift a and drop it on the lane to the right.
    assert!(app.handle_key_event(key(KeyCode::Char(' '))).is_none());
    assert!(app.handle_key_event(key(KeyCode::Right)).is_none());
    let command = app
        .handle_key_event(key(KeyCode::Char(' ')))
        .expect("the drop should issue store work");
    assert_eq!(app.engine.tasks()[0].status, TaskStatus::InProgress);

    cmd_tx.send(command).await.expect("sync should accept the command");
    pump_until(&mut app, &mut evt_rx, |a| !a.toasts.is_empty()).await;

    assert_eq!(app.toasts[0].text, "Failed to update task status");
    assert!(app.toasts[0].failure);
    assert_eq!(app.engine.tasks()[0].status, TaskStatus::Backlog);
}

// ---------------------------------------------------------------------------
// Change notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn change_notification_refreshes_silently() {
    let task = make_task("a", TaskStatus::Backlog, Some(100));
    let id = task.id;
    let store = Arc::new(MemoryStore::with_tasks(vec![task]));
    let (_cmd_tx, mut evt_rx) = spawn_sync(Arc::clone(&store)).await;

    let mut app = App::new();
    pump_until(&mut app, &mut evt_rx, |a| a.engine.tasks().len() == 1).await;

    // Another session moves the task and the store announces it.
    store
        .update_status(id, TaskStatus::Done)
        .await
        .expect("direct write succeeds");
    store.notify_changed();

    pump_until(&mut app, &mut evt_rx, |a| {
        a.engine.tasks()[0].status == TaskStatus::Done
    })
    .await;
    assert!(app.toasts.is_empty(), "background refreshes are silent");
}
