//! Store coordinator for wiring the TUI to the async task store.
//!
//! Bridges the synchronous TUI event loop (crossterm poll-based) with
//! the async [`TaskStore`] implementations. It spawns background tokio
//! tasks and communicates with the main thread via [`SyncCommand`] /
//! [`SyncEvent`] channels.
//!
//! # Architecture
//!
//! ```text
//! TUI (main thread)  ←── SyncEvent ───  tokio background tasks
//!                     ─── SyncCommand →
//! ```
//!
//! The main thread sends [`SyncCommand`]s (persist this mutation,
//! refetch the board) and drains [`SyncEvent`]s on each tick of the
//! poll-based event loop. Every persistence attempt settles as exactly
//! one [`SyncEvent::Settled`], which the board engine consumes to
//! confirm or revert its optimistic state.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use taskdeck_proto::task::Task;

use crate::board::StoreCommand;
use crate::store::{StoreError, TaskStore};

/// Default channel capacity for commands and events.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Commands sent from the TUI main loop to the sync background tasks.
#[derive(Debug)]
pub enum SyncCommand {
    /// Run one persistence operation produced by the board engine.
    Persist(StoreCommand),
    /// Reload the task list from the store.
    Refetch,
    /// Gracefully shut down the sync tasks.
    Shutdown,
}

/// Events sent from the sync background tasks to the TUI main loop.
#[derive(Debug)]
pub enum SyncEvent {
    /// A fresh authoritative task list.
    Tasks(Vec<Task>),
    /// A persistence attempt finished.
    Settled {
        /// Correlation id from the originating [`StoreCommand`].
        request_id: u64,
        /// The store's verdict; the error string is human-readable.
        result: Result<(), String>,
    },
    /// Connection status update.
    ConnectionStatus {
        /// Whether the store can currently accept operations.
        connected: bool,
        /// Human-readable store description.
        store_kind: String,
    },
    /// An error occurred in the sync layer.
    Error(String),
}

/// Spawn the sync background tasks and return channel handles.
///
/// This performs the initial board fetch, then spawns:
///
/// 1. A **command handler** that listens for [`SyncCommand`]s, running
///    each persistence attempt on its own task so a slow store call
///    never delays a later gesture's attempt.
/// 2. A **change listener** that waits on the store's change channel
///    and silently refetches the board on every notification.
pub async fn spawn_sync<S: TaskStore + 'static>(
    store: Arc<S>,
) -> (mpsc::Sender<SyncCommand>, mpsc::Receiver<SyncEvent>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<SyncCommand>(DEFAULT_CHANNEL_CAPACITY);
    let (evt_tx, evt_rx) = mpsc::channel::<SyncEvent>(DEFAULT_CHANNEL_CAPACITY);

    // Report the starting connection state.
    let _ = evt_tx
        .send(SyncEvent::ConnectionStatus {
            connected: store.is_connected(),
            store_kind: store.kind().to_string(),
        })
        .await;

    // Initial load.
    match store.visible_tasks().await {
        Ok(tasks) => {
            let _ = evt_tx.send(SyncEvent::Tasks(tasks)).await;
        }
        Err(e) => {
            let _ = evt_tx
                .send(SyncEvent::Error(format!("initial load failed: {e}")))
                .await;
        }
    }

    // Spawn the command handler.
    let cmd_store = Arc::clone(&store);
    let cmd_evt_tx = evt_tx.clone();
    tokio::spawn(async move {
        command_handler(cmd_store, cmd_rx, cmd_evt_tx).await;
    });

    // Subscribe before spawning so no notification can slip between
    // this function returning and the listener starting.
    let changes = store.subscribe_changes();
    tokio::spawn(async move {
        change_listener(store, changes, evt_tx).await;
    });

    (cmd_tx, evt_rx)
}

/// Background task: handle commands from the TUI main loop.
///
/// Persistence attempts are spawned so they settle independently;
/// refetches run inline so their `Tasks` events keep arrival order.
async fn command_handler<S: TaskStore + 'static>(
    store: Arc<S>,
    mut cmd_rx: mpsc::Receiver<SyncCommand>,
    evt_tx: mpsc::Sender<SyncEvent>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            SyncCommand::Persist(command) => {
                let store = Arc::clone(&store);
                let evt_tx = evt_tx.clone();
                tokio::spawn(async move {
                    let (request_id, result) = run_store_command(&*store, command).await;
                    if let Err(StoreError::ConnectionClosed) = &result {
                        let _ = evt_tx
                            .send(SyncEvent::ConnectionStatus {
                                connected: false,
                                store_kind: store.kind().to_string(),
                            })
                            .await;
                    }
                    let _ = evt_tx
                        .send(SyncEvent::Settled {
                            request_id,
                            result: result.map_err(|e| e.to_string()),
                        })
                        .await;
                });
            }
            SyncCommand::Refetch => match store.visible_tasks().await {
                Ok(tasks) => {
                    let _ = evt_tx.send(SyncEvent::Tasks(tasks)).await;
                }
                Err(e) => {
                    let _ = evt_tx
                        .send(SyncEvent::Error(format!("refetch failed: {e}")))
                        .await;
                }
            },
            SyncCommand::Shutdown => {
                tracing::info!("sync command handler shutting down");
                break;
            }
        }
    }
}

/// Runs one engine-issued command against the store.
async fn run_store_command<S: TaskStore>(
    store: &S,
    command: StoreCommand,
) -> (u64, Result<(), StoreError>) {
    match command {
        StoreCommand::UpdateStatus {
            request_id,
            task,
            status,
        } => (request_id, store.update_status(task, status).await),
        StoreCommand::UpdatePositions {
            request_id,
            updates,
        } => (request_id, store.batch_update_positions(updates).await),
    }
}

/// Background task: refetch the board whenever the store says it may
/// have changed.
///
/// A lagged notification still triggers a refetch; missed signals all
/// collapse into the same reload anyway.
async fn change_listener<S: TaskStore>(
    store: Arc<S>,
    mut changes: broadcast::Receiver<()>,
    evt_tx: mpsc::Sender<SyncEvent>,
) {
    loop {
        match changes.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                match store.visible_tasks().await {
                    Ok(tasks) => {
                        if evt_tx.send(SyncEvent::Tasks(tasks)).await.is_err() {
                            // TUI dropped; exit.
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "reload after change notification failed");
                        let _ = evt_tx
                            .send(SyncEvent::Error(format!("reload failed: {e}")))
                            .await;
                    }
                }
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("store change channel closed");
                let _ = evt_tx
                    .send(SyncEvent::ConnectionStatus {
                        connected: store.is_connected(),
                        store_kind: store.kind().to_string(),
                    })
                    .await;
                break;
            }
        }
    }
}
