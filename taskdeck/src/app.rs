//! Application state and event handling.
//!
//! [`App`] glues the terminal event stream to the board engine and the
//! sync layer: key and mouse events become engine gestures, gestures
//! that amount to a mutation come back as [`SyncCommand`]s for the
//! caller to dispatch, and [`SyncEvent`]s from the background tasks are
//! folded into engine state and toasts.

use std::time::{Duration, Instant};

use crossterm::event::{
    KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use taskdeck_proto::task::{TaskId, TaskStatus};

use crate::board::{BoardEngine, DropTarget, HitMap};
use crate::sync::{SyncCommand, SyncEvent};

/// A transient notification shown over the board.
#[derive(Debug, Clone)]
pub struct Toast {
    /// Message text.
    pub text: String,
    /// Whether this reports a failure (rendered in the error style).
    pub failure: bool,
    created: Instant,
}

/// Position of the keyboard selection on the board, as indices into the
/// rendered columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardCursor {
    /// Index into the visible columns.
    pub column: usize,
    /// Index into the column's cards.
    pub row: usize,
}

/// Main application state.
pub struct App {
    /// Board state and the drag/persistence state machine.
    pub engine: BoardEngine,
    /// Screen regions registered by the last rendered frame.
    pub hit: HitMap,
    /// Keyboard selection.
    pub cursor: CardCursor,
    /// Whether a card is currently lifted via the keyboard.
    pub grabbed: bool,
    /// Pointer position while a mouse drag is active, for the ghost.
    pub pointer: Option<(u16, u16)>,
    /// Last hover target resolved from the pointer.
    pub hover: Option<DropTarget>,
    /// Active toasts, oldest first.
    pub toasts: Vec<Toast>,
    /// Whether the store currently accepts operations.
    pub is_connected: bool,
    /// Human-readable store description ("hub", "local").
    pub store_label: String,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Due date display format (chrono).
    pub due_format: String,
    toast_ttl: Duration,
}

impl App {
    /// Create a new application with an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: BoardEngine::new(),
            hit: HitMap::default(),
            cursor: CardCursor::default(),
            grabbed: false,
            pointer: None,
            hover: None,
            toasts: Vec::new(),
            is_connected: false,
            store_label: String::new(),
            should_quit: false,
            due_format: "%b %d".to_string(),
            toast_ttl: Duration::from_secs(3),
        }
    }

    /// Restrict the board to a subset of columns.
    #[must_use]
    pub fn with_filter(mut self, filter: Option<Vec<TaskStatus>>) -> Self {
        self.engine.set_filter(filter);
        self
    }

    /// Override how long toasts stay on screen.
    #[must_use]
    pub const fn with_toast_ttl(mut self, ttl: Duration) -> Self {
        self.toast_ttl = ttl;
        self
    }

    /// Override the due date display format.
    #[must_use]
    pub fn with_due_format(mut self, format: String) -> Self {
        self.due_format = format;
        self
    }

    /// Fold a sync layer event into application state.
    pub fn handle_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Tasks(tasks) => {
                self.engine.refresh(tasks);
                self.clamp_cursor();
            }
            SyncEvent::Settled { request_id, result } => {
                if let Some(notice) = self.engine.store_settled(request_id, result) {
                    self.push_toast(notice.message(), notice.is_failure());
                    self.clamp_cursor();
                }
            }
            SyncEvent::ConnectionStatus {
                connected,
                store_kind,
            } => {
                if self.is_connected && !connected {
                    self.push_toast(format!("Disconnected from {store_kind}"), true);
                }
                self.is_connected = connected;
                self.store_label = store_kind;
            }
            SyncEvent::Error(msg) => {
                self.push_toast(msg, true);
            }
        }
    }

    /// Handle a key event.
    ///
    /// Returns a [`SyncCommand`] when the key amounts to store work the
    /// caller should dispatch.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), _) => {
                self.should_quit = true;
                None
            }
            (KeyCode::Esc, _) => {
                if self.engine.dragged_task().is_some() {
                    self.cancel_gesture();
                } else {
                    self.should_quit = true;
                }
                None
            }
            (KeyCode::Char('r'), _) => Some(SyncCommand::Refetch),
            (KeyCode::Left | KeyCode::Char('h'), _) => {
                self.move_cursor_horizontal(-1);
                None
            }
            (KeyCode::Right | KeyCode::Char('l'), _) => {
                self.move_cursor_horizontal(1);
                None
            }
            (KeyCode::Up | KeyCode::Char('k'), _) => {
                self.move_cursor_vertical(-1);
                None
            }
            (KeyCode::Down | KeyCode::Char('j'), _) => {
                self.move_cursor_vertical(1);
                None
            }
            (KeyCode::Char(' ') | KeyCode::Enter, _) => self.toggle_grab(),
            _ => None,
        }
    }

    /// Handle a mouse event.
    ///
    /// Left press on a card starts a drag, movement with the button held
    /// updates the hover target, and release classifies the drop.
    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Option<SyncCommand> {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(DropTarget::Card(task)) = self.hit.resolve(mouse.column, mouse.row) {
                    self.engine.drag_start(task);
                    self.pointer = Some((mouse.column, mouse.row));
                }
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.engine.dragged_task().is_some() {
                    self.pointer = Some((mouse.column, mouse.row));
                    self.hover = self.hit.resolve(mouse.column, mouse.row);
                    if let Some(target) = self.hover {
                        self.engine.drag_over(target);
                    }
                }
                None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.engine.dragged_task().is_none() {
                    return None;
                }
                let target = self.hit.resolve(mouse.column, mouse.row);
                let command = self.engine.drag_end(target);
                self.pointer = None;
                self.hover = None;
                self.grabbed = false;
                self.clamp_cursor();
                command.map(SyncCommand::Persist)
            }
            _ => None,
        }
    }

    /// Advance time-based state; call once per event loop iteration.
    pub fn tick(&mut self) {
        let ttl = self.toast_ttl;
        self.toasts.retain(|t| t.created.elapsed() < ttl);
    }

    /// Push a toast notification.
    pub fn push_toast(&mut self, text: impl Into<String>, failure: bool) {
        self.toasts.push(Toast {
            text: text.into(),
            failure,
            created: Instant::now(),
        });
    }

    /// The task under the keyboard cursor, if any.
    #[must_use]
    pub fn selected_task(&self) -> Option<TaskId> {
        let columns = self.engine.columns();
        columns
            .get(self.cursor.column)?
            .tasks
            .get(self.cursor.row)
            .map(|t| t.id)
    }

    /// The drop target the active gesture currently points at, for
    /// rendering the drop highlight.
    #[must_use]
    pub fn active_target(&self) -> Option<DropTarget> {
        if self.engine.dragged_task().is_none() {
            return None;
        }
        if self.grabbed {
            self.cursor_target()
        } else {
            self.hover
        }
    }

    /// Lift the selected card, or drop a lifted card at the cursor.
    fn toggle_grab(&mut self) -> Option<SyncCommand> {
        if self.grabbed {
            let target = self.cursor_target();
            let command = self.engine.drag_end(target);
            self.grabbed = false;
            self.clamp_cursor();
            return command.map(SyncCommand::Persist);
        }
        let task = self.selected_task()?;
        self.engine.drag_start(task);
        self.grabbed = self.engine.dragged_task().is_some();
        None
    }

    /// Abandon the active gesture, mouse or keyboard.
    fn cancel_gesture(&mut self) {
        // A cancelled drop produces no store command by definition.
        let _ = self.engine.drag_end(None);
        self.grabbed = false;
        self.pointer = None;
        self.hover = None;
        self.clamp_cursor();
    }

    /// The drop target at the keyboard cursor: the card under it, or
    /// the column itself when the cursor sits in an empty lane.
    fn cursor_target(&self) -> Option<DropTarget> {
        let columns = self.engine.columns();
        let column = columns.get(self.cursor.column)?;
        match column.tasks.get(self.cursor.row) {
            Some(task) => Some(DropTarget::Card(task.id)),
            None => Some(DropTarget::Column(column.status)),
        }
    }

    fn move_cursor_horizontal(&mut self, delta: isize) {
        let count = self.engine.columns().len();
        if count == 0 {
            return;
        }
        let column = self.cursor.column.min(count - 1);
        self.cursor.column = column
            .saturating_add_signed(delta)
            .min(count - 1);
        self.clamp_cursor();
    }

    fn move_cursor_vertical(&mut self, delta: isize) {
        self.cursor.row = self.cursor.row.saturating_add_signed(delta);
        self.clamp_cursor();
    }

    /// Snap the cursor back into the rendered board after any change to
    /// the task list or column layout.
    fn clamp_cursor(&mut self) {
        let columns = self.engine.columns();
        if columns.is_empty() {
            self.cursor = CardCursor::default();
            return;
        }
        self.cursor.column = self.cursor.column.min(columns.len() - 1);
        let len = columns[self.cursor.column].tasks.len();
        self.cursor.row = if len == 0 {
            0
        } else {
            self.cursor.row.min(len - 1)
        };
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
