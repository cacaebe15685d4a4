//! Hub server core: shared state, WebSocket handler, session registry,
//! and change fan-out.
//!
//! The hub accepts WebSocket connections, registers one session per
//! user (a reconnect replaces the previous session), and serves board
//! reads and writes against the shared [`BoardStore`]. Every applied
//! write is acknowledged to the writer and announced to all other
//! sessions with a payload-free [`HubMessage::Changed`] push, which
//! subscribed clients answer with a silent refetch.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{RwLock, mpsc};

use taskdeck_proto::wire::{self, HubMessage};

use crate::board::BoardStore;

/// Shared hub state holding the session registry and the board table.
pub struct HubState {
    /// Maps user name to a channel sender for delivering WebSocket messages.
    sessions: RwLock<HashMap<String, mpsc::UnboundedSender<Message>>>,
    /// The shared task table with per-user positions.
    pub board: BoardStore,
}

impl Default for HubState {
    fn default() -> Self {
        Self::new()
    }
}

impl HubState {
    /// Creates a new hub state with an empty session registry and board.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            board: BoardStore::new(),
        }
    }

    /// Creates a hub state around a pre-filled board.
    #[must_use]
    pub fn with_board(board: BoardStore) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            board,
        }
    }

    /// Registers a user session, storing the sender half of its channel.
    ///
    /// If the user already had a session, the old sender is replaced and
    /// the old channel is effectively closed (the previous writer task
    /// detects the closure and shuts down).
    pub async fn register(
        &self,
        user: &str,
        sender: mpsc::UnboundedSender<Message>,
    ) -> Option<mpsc::UnboundedSender<Message>> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(user.to_string(), sender)
    }

    /// Removes a user session, returning the sender if it existed.
    pub async fn unregister(&self, user: &str) -> Option<mpsc::UnboundedSender<Message>> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(user)
    }

    /// Returns a clone of the sender for the given user, if registered.
    pub async fn get_sender(&self, user: &str) -> Option<mpsc::UnboundedSender<Message>> {
        let sessions = self.sessions.read().await;
        sessions.get(user).cloned()
    }

    /// Announces a board change to every session except the writer.
    ///
    /// The writer already holds the optimistic state and receives an
    /// `Ack` instead; echoing `Changed` back would only trigger a
    /// redundant refetch.
    pub async fn broadcast_changed(&self, writer: &str) {
        let encoded = match wire::encode(&HubMessage::Changed) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode Changed push");
                return;
            }
        };
        let sessions = self.sessions.read().await;
        for (user, sender) in sessions.iter() {
            if user == writer {
                continue;
            }
            if sender.send(Message::Binary(encoded.clone().into())).is_err() {
                tracing::debug!(user = %user, "session channel closed, skipping Changed push");
            }
        }
    }
}

/// Handles an upgraded WebSocket connection for a single board session.
///
/// The connection lifecycle:
/// 1. Wait for a `Hello` message naming the user.
/// 2. Register the session and send `Welcome` back.
/// 3. Enter the request loop, serving fetches and writes.
/// 4. On disconnect, unregister the session.
pub async fn handle_socket(socket: WebSocket, state: Arc<HubState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Wait for the Hello message.
    let Some(user) = wait_for_hello(&mut ws_receiver).await else {
        tracing::warn!("connection closed before handshake");
        return;
    };

    tracing::info!(user = %user, "session starting");

    // Create a channel for sending messages to this session's writer.
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Register the session (replaces the old one on reconnect).
    if state.register(&user, tx).await.is_some() {
        tracing::info!(user = %user, "replaced existing session (duplicate hello)");
    }

    // Send Welcome acknowledgment.
    let welcome = HubMessage::Welcome { user: user.clone() };
    if let Err(e) = send_hub_msg(&mut ws_sender, &welcome).await {
        tracing::error!(user = %user, error = %e, "failed to send Welcome");
        state.unregister(&user).await;
        return;
    }

    tracing::info!(user = %user, "session registered");

    // Spawn a writer task that forwards channel messages to the WebSocket.
    let writer_user = user.clone();
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!(user = %writer_user, "WebSocket write failed");
                break;
            }
        }
    });

    // Reader loop: process incoming requests from this session.
    let reader_user = user.clone();
    let reader_state = Arc::clone(&state);
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Binary(data) => {
                    handle_request(&reader_user, &data, &reader_state).await;
                }
                Message::Close(_) => {
                    tracing::info!(user = %reader_user, "received close frame");
                    break;
                }
                _ => {
                    // Ignore text, ping, pong frames.
                }
            }
        }
    });

    // Wait for either task to finish, then abort the other.
    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    // Clean up: unregister the session.
    state.unregister(&user).await;
    tracing::info!(user = %user, "session disconnected and unregistered");
}

/// Waits for the first message on the WebSocket, expecting a `Hello`.
///
/// Returns the user name if a valid `Hello` is received, or `None` if
/// the connection closes or an invalid message arrives.
async fn wait_for_hello(
    receiver: &mut (impl StreamExt<Item = Result<Message, axum::Error>> + Unpin),
) -> Option<String> {
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Binary(data) => match wire::decode(&data) {
                Ok(HubMessage::Hello { user }) => {
                    if user.is_empty() {
                        tracing::warn!("received Hello with empty user");
                        return None;
                    }
                    return Some(user);
                }
                Ok(other) => {
                    tracing::warn!(msg = ?other, "expected Hello, got different message");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to decode handshake message");
                    return None;
                }
            },
            Message::Close(_) => return None,
            _ => {
                // Skip non-binary frames (ping/pong) during the handshake.
            }
        }
    }
    None
}

/// Handles a binary WebSocket request from a registered session.
async fn handle_request(user: &str, data: &[u8], state: &Arc<HubState>) {
    let msg = match wire::decode(data) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(user = %user, error = %e, "failed to decode request");
            return;
        }
    };

    match msg {
        HubMessage::FetchTasks => {
            let tasks = state.board.tasks_for(user).await;
            tracing::debug!(user = %user, count = tasks.len(), "serving task list");
            send_to_session(state, user, &HubMessage::TaskList { tasks }).await;
        }
        HubMessage::UpdateStatus {
            request_id,
            task,
            status,
        } => {
            match state.board.set_status(task, status).await {
                Ok(()) => {
                    tracing::info!(
                        user = %user,
                        task = %task,
                        status = %status,
                        "status updated"
                    );
                    send_to_session(state, user, &HubMessage::Ack { request_id }).await;
                    state.broadcast_changed(user).await;
                }
                Err(e) => {
                    tracing::warn!(user = %user, task = %task, error = %e, "status update refused");
                    let refused = HubMessage::Refused {
                        request_id,
                        reason: e.to_string(),
                    };
                    send_to_session(state, user, &refused).await;
                }
            }
        }
        HubMessage::UpdatePositions {
            request_id,
            updates,
        } => {
            match state.board.set_positions(user, &updates).await {
                Ok(()) => {
                    tracing::info!(
                        user = %user,
                        count = updates.len(),
                        "positions updated"
                    );
                    send_to_session(state, user, &HubMessage::Ack { request_id }).await;
                    state.broadcast_changed(user).await;
                }
                Err(e) => {
                    tracing::warn!(user = %user, error = %e, "position batch refused");
                    let refused = HubMessage::Refused {
                        request_id,
                        reason: e.to_string(),
                    };
                    send_to_session(state, user, &refused).await;
                }
            }
        }
        HubMessage::Hello { user: new_user } => {
            tracing::warn!(
                user = %user,
                new_user = %new_user,
                "received duplicate Hello from registered session"
            );
        }
        other => {
            tracing::warn!(
                user = %user,
                msg = ?other,
                "unexpected message type from client"
            );
        }
    }
}

/// Sends a hub message to a registered session via its channel.
async fn send_to_session(state: &Arc<HubState>, user: &str, msg: &HubMessage) {
    if let Some(sender) = state.get_sender(user).await
        && let Ok(bytes) = wire::encode(msg)
    {
        let _ = sender.send(Message::Binary(bytes.into()));
    }
}

/// Encodes and sends a hub message directly on a WebSocket sender.
async fn send_hub_msg(
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    msg: &HubMessage,
) -> Result<(), String> {
    let bytes = wire::encode(msg).map_err(|e| e.to_string())?;
    ws_sender
        .send(Message::Binary(bytes.into()))
        .await
        .map_err(|e| format!("WebSocket send error: {e}"))
}

/// Starts the hub server on the given address and returns the bound
/// address and a join handle.
///
/// This is the primary entry point used by both `main.rs` and test code.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(HubState::new())).await
}

/// Starts the hub server with a pre-configured [`HubState`].
///
/// Use [`HubState::with_board`] to serve a pre-seeded board.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<HubState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = axum::Router::new()
        .route("/ws", axum::routing::get(ws_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "hub server error");
        }
    });

    Ok((bound_addr, handle))
}

/// axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler(
    ws: axum::extract::ws::WebSocketUpgrade,
    axum::extract::State(state): axum::extract::State<Arc<HubState>>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}
