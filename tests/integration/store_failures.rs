//! Failure-path tests: store refusals and dead connections, and the
//! optimistic reverts they must trigger.
//!
//! Runs engine gestures through the real sync layer against stores
//! that say no, checking that the board ends up exactly where it was
//! before the refused gesture.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::similar_names)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

use taskdeck::board::{BoardEngine, DropTarget, Notice, StoreCommand};
use taskdeck::store::memory::MemoryStore;
use taskdeck::store::{StoreError, StoreKind, TaskStore};
use taskdeck::sync::{SyncCommand, SyncEvent, spawn_sync};
use taskdeck_proto::task::{
    PositionUpdate, Task, TaskId, TaskKind, TaskPriority, TaskStatus,
};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Monotonic counter to avoid seed path collisions across parallel tests.
static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_seed_path(name: &str) -> PathBuf {
    let n = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("taskdeck-seed-{name}-{}-{n}.json", std::process::id()))
}

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

/// Waits for the next settlement, skipping other event kinds.
async fn next_settlement(evt_rx: &mut mpsc::Receiver<SyncEvent>) -> (u64, Result<(), String>) {
    loop {
        let event = timeout(Duration::from_secs(2), evt_rx.recv())
            .await
            .expect("an event should arrive")
            .expect("event channel should stay open");
        if let SyncEvent::Settled { request_id, result } = event {
            return (request_id, result);
        }
    }
}

/// A store whose connection has already died. Every call fails the way
/// a torn-down WebSocket session does.
struct ClosedStore {
    changes: broadcast::Sender<()>,
}

impl ClosedStore {
    fn new() -> Self {
        let (changes, _) = broadcast::channel(4);
        Self { changes }
    }
}

impl TaskStore for ClosedStore {
    async fn update_status(&self, _task: TaskId, _status: TaskStatus) -> Result<(), StoreError> {
        Err(StoreError::ConnectionClosed)
    }

    async fn batch_update_positions(
        &self,
        _updates: Vec<PositionUpdate>,
    ) -> Result<(), StoreError> {
        Err(StoreError::ConnectionClosed)
    }

    async fn visible_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Err(StoreError::ConnectionClosed)
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<()> {
        self.changes.subscribe()
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Hub
    }
}

// ---------------------------------------------------------------------------
// Refused writes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refused_reorder_restores_the_pre_drag_board() {
    let a = make_task("a", TaskStatus::Backlog, Some(100));
    let b = make_task("b", TaskStatus::Backlog, Some(200));
    let (ida, idb) = (a.id, b.id);
    let mut engine = BoardEngine::with_tasks(vec![a, b]);
    let before = engine.tasks().to_vec();

    // The board was cleared server-side, so every id is now unknown.
    let store = Arc::new(MemoryStore::new());
    let (cmd_tx, mut evt_rx) = spawn_sync(store).await;

    engine.drag_start(idb);
    let command = engine
        .drag_end(Some(DropTarget::Card(ida)))
        .expect("the drop should produce a reorder");
    assert_ne!(engine.tasks(), before.as_slice(), "the move shows at once");

    cmd_tx
        .send(SyncCommand::Persist(command))
        .await
        .expect("sync should accept the command");

    let (request_id, result) = next_settlement(&mut evt_rx).await;
    assert!(result.is_err(), "the store no longer knows these tasks");
    assert_eq!(
        engine.store_settled(request_id, result),
        Some(Notice::OrderFailed)
    );
    assert_eq!(engine.tasks(), before.as_slice());
}

#[tokio::test]
async fn refused_status_change_reverts_only_the_moved_task() {
    let a = make_task("a", TaskStatus::Backlog, Some(100));
    let b = make_task("b", TaskStatus::Backlog, Some(200));
    let d = make_task("d", TaskStatus::InProgress, Some(100));
    let (ida, idd) = (a.id, d.id);
    let mut engine = BoardEngine::with_tasks(vec![a, b, d]);

    let store = Arc::new(MemoryStore::new());
    let (cmd_tx, mut evt_rx) = spawn_sync(store).await;

    engine.drag_start(ida);
    engine.drag_over(DropTarget::Column(TaskStatus::Done));
    let command = engine
        .drag_end(Some(DropTarget::Column(TaskStatus::Done)))
        .expect("the drop should produce a status change");
    assert!(matches!(command, StoreCommand::UpdateStatus { .. }));

    cmd_tx
        .send(SyncCommand::Persist(command))
        .await
        .expect("sync should accept the command");

    let (request_id, result) = next_settlement(&mut evt_rx).await;
    assert_eq!(
        engine.store_settled(request_id, result),
        Some(Notice::StatusFailed)
    );

    let status_of = |id: TaskId| {
        engine
            .tasks()
            .iter()
            .find(|t| t.id == id)
            .expect("task present")
            .status
    };
    assert_eq!(status_of(ida), TaskStatus::Backlog, "the move was undone");
    assert_eq!(status_of(idd), TaskStatus::InProgress, "bystanders untouched");
}

#[tokio::test]
async fn memory_store_refuses_unknown_ids_atomically() {
    let seed = make_task("real", TaskStatus::Backlog, None);
    let known = seed.id;
    let store = MemoryStore::with_tasks(vec![seed]);

    let result = store.update_status(TaskId::new(), TaskStatus::Done).await;
    assert!(matches!(result, Err(StoreError::Refused(_))));

    let result = store
        .batch_update_positions(vec![
            PositionUpdate { task: known, position: 100 },
            PositionUpdate { task: TaskId::new(), position: 200 },
        ])
        .await;
    assert!(matches!(result, Err(StoreError::Refused(_))));

    let tasks = store.visible_tasks().await.expect("fetch succeeds");
    assert_eq!(tasks[0].position, None, "the refused batch half-applied");
}

// ---------------------------------------------------------------------------
// Lost connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dead_connection_settles_the_attempt_and_flags_disconnect() {
    let task = make_task("a", TaskStatus::Backlog, Some(100));
    let id = task.id;
    let mut engine = BoardEngine::with_tasks(vec![task]);

    let store = Arc::new(ClosedStore::new());
    let (cmd_tx, mut evt_rx) = spawn_sync(store).await;

    // Startup reports the dead link and a failed initial load.
    let first = timeout(Duration::from_secs(2), evt_rx.recv())
        .await
        .expect("startup event")
        .expect("channel open");
    assert!(matches!(
        first,
        SyncEvent::ConnectionStatus { connected: false, .. }
    ));
    let second = timeout(Duration::from_secs(2), evt_rx.recv())
        .await
        .expect("startup event")
        .expect("channel open");
    assert!(matches!(second, SyncEvent::Error(_)));

    engine.drag_start(id);
    engine.drag_over(DropTarget::Column(TaskStatus::Done));
    let command = engine
        .drag_end(Some(DropTarget::Column(TaskStatus::Done)))
        .expect("the drop should produce a status change");

    cmd_tx
        .send(SyncCommand::Persist(command))
        .await
        .expect("sync should accept the command");

    // The attempt still settles, so the engine can revert rather than
    // sit in the saving state forever.
    let (request_id, result) = next_settlement(&mut evt_rx).await;
    assert!(result.is_err());
    assert_eq!(
        engine.store_settled(request_id, result),
        Some(Notice::StatusFailed)
    );
    assert_eq!(engine.tasks()[0].status, TaskStatus::Backlog);
}

// ---------------------------------------------------------------------------
// Seed files
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_seed_file_is_rejected() {
    let path = temp_seed_path("malformed");
    std::fs::write(&path, "{ not json ]").expect("write seed file");

    let result = MemoryStore::from_seed_file(&path);
    assert!(matches!(result, Err(StoreError::Seed(_))));

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn missing_seed_file_is_an_io_error() {
    let path = temp_seed_path("missing");
    let result = MemoryStore::from_seed_file(&path);
    assert!(matches!(result, Err(StoreError::Io(_))));
}

#[tokio::test]
async fn valid_seed_file_loads_the_board() {
    let path = temp_seed_path("valid");
    let tasks = vec![
        make_task("from disk", TaskStatus::Backlog, Some(100)),
        make_task("also from disk", TaskStatus::Done, None),
    ];
    let json = serde_json::to_string(&tasks).expect("serialize seed");
    std::fs::write(&path, json).expect("write seed file");

    let store = MemoryStore::from_seed_file(&path).expect("seed should load");
    let loaded = store.visible_tasks().await.expect("fetch succeeds");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].title, "from disk");
    assert_eq!(loaded[1].status, TaskStatus::Done);

    let _ = std::fs::remove_file(&path);
}
