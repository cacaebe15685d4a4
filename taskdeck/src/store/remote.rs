//! WebSocket hub client implementing the [`TaskStore`] trait.
//!
//! Connects to a `TaskDeck` hub, performs the hello handshake, and
//! correlates acknowledgments with outstanding requests by request id.
//! Change pushes from the hub are fanned out to subscribers through a
//! broadcast channel.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, broadcast, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use taskdeck_proto::task::{PositionUpdate, Task, TaskId, TaskStatus};
use taskdeck_proto::wire::{self, HubMessage};

use super::{StoreError, StoreKind, TaskStore};

/// Type alias for the write half of a WebSocket connection.
type WsSender = futures_util::stream::SplitSink<
    WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;

/// Type alias for the read half of a WebSocket connection.
type WsReader =
    futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

/// Waiters for write acknowledgments, keyed by request id.
type AckWaiters = Arc<parking_lot::Mutex<HashMap<u64, oneshot::Sender<Result<(), String>>>>>;

/// Waiters for task list responses, answered in FIFO order.
type FetchWaiters = Arc<parking_lot::Mutex<VecDeque<oneshot::Sender<Vec<Task>>>>>;

/// Default timeout for connecting to the hub.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for waiting for the `Welcome` handshake response.
const HELLO_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for any single request/acknowledgment round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the change-notification channel.
const CHANGE_CAPACITY: usize = 16;

/// WebSocket hub client.
///
/// Created via [`RemoteStore::connect`], which establishes the
/// connection, completes the handshake, and spawns a background reader
/// task that routes responses to waiting callers.
pub struct RemoteStore {
    /// The user this session is registered as.
    user: String,
    /// The hub URL (ws:// or wss://).
    hub_url: String,
    /// Write half of the WebSocket connection (shared for concurrent sends).
    ws_sender: Arc<Mutex<WsSender>>,
    /// Outstanding write acknowledgments by request id.
    acks: AckWaiters,
    /// Outstanding task list fetches, oldest first.
    fetches: FetchWaiters,
    /// Fan-out for `Changed` pushes from the hub.
    changes: broadcast::Sender<()>,
    /// Whether the WebSocket connection to the hub is active.
    connected: Arc<AtomicBool>,
    /// Source of request ids for this session.
    next_request_id: AtomicU64,
    /// Handle to the background reader task (kept alive for the store's lifetime).
    _reader_handle: tokio::task::JoinHandle<()>,
}

impl RemoteStore {
    /// Connect to a hub and register as `user`.
    ///
    /// Performs the following steps:
    /// 1. Establishes a WebSocket connection to `hub_url` (10s timeout)
    /// 2. Sends a `Hello` message with the user name
    /// 3. Waits for the `Welcome` acknowledgment (5s timeout)
    /// 4. Spawns a background task to route incoming messages
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`] if connection or handshake times out.
    /// - [`StoreError::Unreachable`] if the hub cannot be reached.
    /// - [`StoreError::Io`] for TLS failures or a malformed handshake reply.
    pub async fn connect(hub_url: &str, user: &str) -> Result<Self, StoreError> {
        let (ws_stream, _response) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(hub_url))
            .await
            .map_err(|_| {
                tracing::warn!(url = hub_url, "hub WebSocket connect timed out");
                StoreError::Timeout
            })?
            .map_err(|e| {
                tracing::warn!(url = hub_url, err = %e, "hub WebSocket connect failed");
                map_ws_connect_error(hub_url, e)
            })?;

        let (mut ws_sender, mut ws_reader) = ws_stream.split();

        let hello = HubMessage::Hello {
            user: user.to_string(),
        };
        let hello_bytes = wire::encode(&hello)?;
        ws_sender
            .send(Message::Binary(hello_bytes.into()))
            .await
            .map_err(|e| {
                tracing::warn!(err = %e, "failed to send Hello message");
                StoreError::Io(std::io::Error::other(format!("failed to send Hello: {e}")))
            })?;

        let reply = tokio::time::timeout(HELLO_TIMEOUT, ws_reader.next())
            .await
            .map_err(|_| {
                tracing::warn!(url = hub_url, "hub handshake timed out");
                StoreError::Timeout
            })?;

        match reply {
            Some(Ok(Message::Binary(data))) => match wire::decode(&data) {
                Ok(HubMessage::Welcome { user: confirmed }) => {
                    tracing::info!(user = %confirmed, url = hub_url, "registered with hub");
                }
                Ok(other) => {
                    tracing::warn!(?other, "unexpected hub response during handshake");
                    return Err(StoreError::Io(std::io::Error::other(
                        "unexpected response during handshake",
                    )));
                }
                Err(e) => {
                    tracing::warn!(err = %e, "malformed hub handshake response");
                    return Err(StoreError::Io(std::io::Error::other(format!(
                        "malformed handshake response: {e}"
                    ))));
                }
            },
            Some(Ok(Message::Close(_))) => {
                tracing::warn!("hub closed connection during handshake");
                return Err(StoreError::ConnectionClosed);
            }
            Some(Ok(_)) => {
                tracing::warn!("unexpected non-binary frame during handshake");
                return Err(StoreError::Io(std::io::Error::other(
                    "unexpected non-binary frame during handshake",
                )));
            }
            Some(Err(e)) => {
                tracing::warn!(err = %e, "WebSocket error during handshake");
                return Err(StoreError::Io(std::io::Error::other(format!(
                    "WebSocket error during handshake: {e}"
                ))));
            }
            None => {
                tracing::warn!("hub WebSocket stream ended during handshake");
                return Err(StoreError::ConnectionClosed);
            }
        }

        let acks: AckWaiters = Arc::new(parking_lot::Mutex::new(HashMap::new()));
        let fetches: FetchWaiters = Arc::new(parking_lot::Mutex::new(VecDeque::new()));
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        let connected = Arc::new(AtomicBool::new(true));

        let reader_handle = tokio::spawn(reader_loop(
            ws_reader,
            Arc::clone(&acks),
            Arc::clone(&fetches),
            changes.clone(),
            Arc::clone(&connected),
        ));

        Ok(Self {
            user: user.to_string(),
            hub_url: hub_url.to_string(),
            ws_sender: Arc::new(Mutex::new(ws_sender)),
            acks,
            fetches,
            changes,
            connected,
            next_request_id: AtomicU64::new(1),
            _reader_handle: reader_handle,
        })
    }

    /// Return the hub URL this store is connected to.
    #[must_use]
    pub fn hub_url(&self) -> &str {
        &self.hub_url
    }

    /// Return the user this session is registered as.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Sends an encoded message on the shared WebSocket sender.
    async fn send_frame(&self, msg: &HubMessage) -> Result<(), StoreError> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(StoreError::ConnectionClosed);
        }
        let bytes = wire::encode(msg)?;
        let mut sender = self.ws_sender.lock().await;
        sender
            .send(Message::Binary(bytes.into()))
            .await
            .map_err(|e| {
                tracing::warn!(err = %e, "hub send failed");
                self.connected.store(false, Ordering::Relaxed);
                StoreError::ConnectionClosed
            })
    }

    /// Sends a write request and waits for its acknowledgment.
    async fn send_write(&self, request_id: u64, msg: &HubMessage) -> Result<(), StoreError> {
        let (tx, rx) = oneshot::channel();
        self.acks.lock().insert(request_id, tx);

        if let Err(e) = self.send_frame(msg).await {
            self.acks.lock().remove(&request_id);
            return Err(e);
        }

        match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(reason))) => Err(StoreError::Refused(reason)),
            // The reader dropped our waiter: connection is gone.
            Ok(Err(_)) => Err(StoreError::ConnectionClosed),
            Err(_) => {
                self.acks.lock().remove(&request_id);
                Err(StoreError::Timeout)
            }
        }
    }

    fn issue_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl TaskStore for RemoteStore {
    /// Persist a status change via the hub.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Refused`] when the hub rejects the update.
    /// - [`StoreError::ConnectionClosed`] when the hub connection is down.
    /// - [`StoreError::Timeout`] when no acknowledgment arrives in time.
    async fn update_status(&self, task: TaskId, status: TaskStatus) -> Result<(), StoreError> {
        let request_id = self.issue_request_id();
        let msg = HubMessage::UpdateStatus {
            request_id,
            task,
            status,
        };
        self.send_write(request_id, &msg).await
    }

    /// Persist a position batch via the hub.
    ///
    /// The hub validates the whole batch before applying any of it, so
    /// a refusal means no position changed.
    async fn batch_update_positions(
        &self,
        updates: Vec<PositionUpdate>,
    ) -> Result<(), StoreError> {
        let request_id = self.issue_request_id();
        let msg = HubMessage::UpdatePositions {
            request_id,
            updates,
        };
        self.send_write(request_id, &msg).await
    }

    /// Fetch the task list visible to this user.
    async fn visible_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let (tx, rx) = oneshot::channel();
        self.fetches.lock().push_back(tx);

        if let Err(e) = self.send_frame(&HubMessage::FetchTasks).await {
            // Drop our waiter again; it is the most recent one.
            self.fetches.lock().pop_back();
            return Err(e);
        }

        match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(tasks)) => Ok(tasks),
            Ok(Err(_)) => Err(StoreError::ConnectionClosed),
            Err(_) => Err(StoreError::Timeout),
        }
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<()> {
        self.changes.subscribe()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Hub
    }
}

/// Background task that routes incoming hub messages to waiters.
///
/// Acknowledgments resolve their matching request by id, task lists
/// answer the oldest outstanding fetch, and `Changed` pushes go to the
/// broadcast channel. Malformed frames are logged and skipped; the
/// task does not disconnect on bad data.
///
/// Sets `connected` to `false` and drops all waiters when the
/// WebSocket closes or errors out, so blocked callers fail fast
/// instead of timing out.
async fn reader_loop(
    mut ws_reader: WsReader,
    acks: AckWaiters,
    fetches: FetchWaiters,
    changes: broadcast::Sender<()>,
    connected: Arc<AtomicBool>,
) {
    while let Some(msg_result) = ws_reader.next().await {
        match msg_result {
            Ok(Message::Binary(data)) => match wire::decode(&data) {
                Ok(HubMessage::Ack { request_id }) => {
                    if let Some(waiter) = acks.lock().remove(&request_id) {
                        let _ = waiter.send(Ok(()));
                    } else {
                        tracing::debug!(request_id, "ack with no waiter");
                    }
                }
                Ok(HubMessage::Refused { request_id, reason }) => {
                    if let Some(waiter) = acks.lock().remove(&request_id) {
                        let _ = waiter.send(Err(reason));
                    } else {
                        tracing::debug!(request_id, reason = %reason, "refusal with no waiter");
                    }
                }
                Ok(HubMessage::TaskList { tasks }) => {
                    if let Some(waiter) = fetches.lock().pop_front() {
                        let _ = waiter.send(tasks);
                    } else {
                        tracing::debug!(count = tasks.len(), "task list with no waiter");
                    }
                }
                Ok(HubMessage::Changed) => {
                    // No receivers is fine; nobody is listening yet.
                    let _ = changes.send(());
                }
                Ok(other) => {
                    tracing::debug!(?other, "unexpected hub message type");
                }
                Err(e) => {
                    tracing::warn!(err = %e, "malformed hub frame, skipping");
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!("hub WebSocket closed by server");
                break;
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Text(_) | Message::Frame(_)) => {
                // Ignore control, text, and raw frames.
            }
            Err(e) => {
                tracing::warn!(err = %e, "hub WebSocket read error");
                break;
            }
        }
    }
    connected.store(false, Ordering::Relaxed);
    // Dropping the waiters closes their channels.
    acks.lock().clear();
    fetches.lock().clear();
    tracing::info!("hub reader task exiting");
}

/// Map a `tokio_tungstenite` connection error to a [`StoreError`].
fn map_ws_connect_error(hub_url: &str, err: tokio_tungstenite::tungstenite::Error) -> StoreError {
    use tokio_tungstenite::tungstenite::Error as WsError;
    match err {
        WsError::Io(io_err) => {
            // DNS/network failures surface as io errors.
            if io_err.kind() == std::io::ErrorKind::ConnectionRefused
                || io_err.kind() == std::io::ErrorKind::AddrNotAvailable
            {
                StoreError::Unreachable(hub_url.to_string())
            } else {
                StoreError::Io(io_err)
            }
        }
        WsError::Tls(_) => StoreError::Io(std::io::Error::other(format!("TLS error: {err}"))),
        WsError::Http(response) => StoreError::Io(std::io::Error::other(format!(
            "hub HTTP error: status {}",
            response.status()
        ))),
        other => StoreError::Io(std::io::Error::other(format!(
            "hub connection error: {other}"
        ))),
    }
}
