//! In-process task store for offline and demo use.
//!
//! Holds the whole board in a mutex-guarded list. Positions live
//! directly on the tasks since there is only one user to order for.
//! Writes validate against the current list the same way the hub does,
//! so failure behavior matches the remote path.

use std::path::Path;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use taskdeck_proto::task::{
    PositionUpdate, Task, TaskId, TaskKind, TaskPriority, TaskStatus,
};

use super::{StoreError, StoreKind, TaskStore};

/// Capacity of the change-notification channel.
const CHANGE_CAPACITY: usize = 16;

/// In-memory [`TaskStore`] implementation.
pub struct MemoryStore {
    tasks: Mutex<Vec<Task>>,
    changes: broadcast::Sender<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tasks(Vec::new())
    }

    /// Creates a store holding the given tasks.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            tasks: Mutex::new(tasks),
            changes,
        }
    }

    /// Creates a store pre-filled with a small demo board.
    #[must_use]
    pub fn demo() -> Self {
        Self::with_tasks(demo_tasks())
    }

    /// Loads a store from a JSON seed file holding an array of tasks.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the file cannot be read and
    /// [`StoreError::Seed`] when it does not parse as a task array.
    pub fn from_seed_file(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path)?;
        let tasks: Vec<Task> =
            serde_json::from_str(&contents).map_err(|e| StoreError::Seed(e.to_string()))?;
        Ok(Self::with_tasks(tasks))
    }

    /// Wakes subscribers as if the board had changed elsewhere.
    pub fn notify_changed(&self) {
        let _ = self.changes.send(());
    }
}

impl TaskStore for MemoryStore {
    async fn update_status(&self, task: TaskId, status: TaskStatus) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock();
        match tasks.iter_mut().find(|t| t.id == task) {
            Some(t) => {
                t.status = status;
                Ok(())
            }
            None => Err(StoreError::Refused(format!("unknown task {task}"))),
        }
    }

    async fn batch_update_positions(
        &self,
        updates: Vec<PositionUpdate>,
    ) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock();
        // Validate the whole batch before applying any of it.
        if let Some(missing) = updates
            .iter()
            .find(|u| !tasks.iter().any(|t| t.id == u.task))
        {
            return Err(StoreError::Refused(format!("unknown task {}", missing.task)));
        }
        for update in updates {
            if let Some(t) = tasks.iter_mut().find(|t| t.id == update.task) {
                t.position = Some(update.position);
            }
        }
        Ok(())
    }

    async fn visible_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Ok(self.tasks.lock().clone())
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<()> {
        self.changes.subscribe()
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }
}

/// A handful of tasks spread across the board, for trying the client
/// without a hub.
#[must_use]
pub fn demo_tasks() -> Vec<Task> {
    let mk = |title: &str, status: TaskStatus, priority, kind, position| Task {
        id: TaskId::new(),
        title: title.to_string(),
        description: String::new(),
        status,
        priority,
        kind,
        project: Some("demo".to_string()),
        assignees: vec!["you".to_string()],
        reviewers: vec![],
        due_ms: None,
        position: Some(position),
        created_ms: 0,
    };
    vec![
        mk(
            "Sketch onboarding flow",
            TaskStatus::Backlog,
            TaskPriority::Medium,
            TaskKind::Feature,
            100,
        ),
        mk(
            "Fix login redirect loop",
            TaskStatus::Backlog,
            TaskPriority::Urgent,
            TaskKind::Bug,
            200,
        ),
        mk(
            "Upgrade CI runners",
            TaskStatus::InProgress,
            TaskPriority::Low,
            TaskKind::Chore,
            100,
        ),
        mk(
            "Evaluate search backends",
            TaskStatus::WaitingReview,
            TaskPriority::Medium,
            TaskKind::Research,
            100,
        ),
        mk(
            "Draft pricing page copy",
            TaskStatus::SentClient,
            TaskPriority::High,
            TaskKind::Feature,
            100,
        ),
        mk(
            "Rework dashboard charts",
            TaskStatus::Feedback,
            TaskPriority::Medium,
            TaskKind::Feature,
            100,
        ),
        mk(
            "Ship dark mode",
            TaskStatus::Approved,
            TaskPriority::High,
            TaskKind::Feature,
            100,
        ),
        mk(
            "Remove legacy importer",
            TaskStatus::Done,
            TaskPriority::Low,
            TaskKind::Chore,
            100,
        ),
    ]
}
