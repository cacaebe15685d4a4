//! In-memory board storage for the hub.
//!
//! The [`BoardStore`] holds the shared task table plus one position map
//! per user. Statuses are shared by everyone; lane positions are
//! private to each user, so two users can order the same lane
//! differently. Reads resolve a user's positions into the returned
//! [`Task`] records.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;

use taskdeck_proto::task::{PositionUpdate, Task, TaskId, TaskKind, TaskPriority, TaskStatus};

/// Errors returned by board store writes.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// A write referenced a task that is not in the table.
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),
}

/// One stored task: the shared record plus per-user lane positions.
struct TaskRecord {
    task: Task,
    /// Maps user name to that user's position for this task.
    positions: HashMap<String, u32>,
}

/// In-memory task table with per-user position maps.
///
/// Thread-safe via [`RwLock`]. The canonical record keeps `position`
/// unset; positions live in the per-user map and are resolved into the
/// clones returned by [`BoardStore::tasks_for`].
pub struct BoardStore {
    records: RwLock<HashMap<TaskId, TaskRecord>>,
}

impl Default for BoardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardStore {
    /// Creates a new, empty board store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a task into the table.
    ///
    /// Any `position` carried by the task is discarded; positions are
    /// per user and only ever written through
    /// [`BoardStore::set_positions`].
    pub async fn insert(&self, mut task: Task) {
        task.position = None;
        let mut records = self.records.write().await;
        records.insert(
            task.id,
            TaskRecord {
                task,
                positions: HashMap::new(),
            },
        );
    }

    /// Returns every task visible to `user`, with that user's positions
    /// resolved.
    ///
    /// Tasks are returned in creation order (ties broken by id) so that
    /// unpositioned tasks have a stable insertion order on every fetch.
    pub async fn tasks_for(&self, user: &str) -> Vec<Task> {
        let records = self.records.read().await;
        let mut tasks: Vec<Task> = records
            .values()
            .map(|record| {
                let mut task = record.task.clone();
                task.position = record.positions.get(user).copied();
                task
            })
            .collect();
        tasks.sort_by(|a, b| {
            a.created_ms
                .cmp(&b.created_ms)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        tasks
    }

    /// Moves a task to a new status lane.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownTask`] if the task is not in the table.
    pub async fn set_status(&self, task: TaskId, status: TaskStatus) -> Result<(), BoardError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&task).ok_or(BoardError::UnknownTask(task))?;
        record.task.status = status;
        Ok(())
    }

    /// Applies a batch of position writes for one user.
    ///
    /// The batch is atomic: if any entry references an unknown task,
    /// nothing is applied.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::UnknownTask`] naming the first unknown task.
    pub async fn set_positions(
        &self,
        user: &str,
        updates: &[PositionUpdate],
    ) -> Result<(), BoardError> {
        let mut records = self.records.write().await;
        if let Some(missing) = updates.iter().find(|u| !records.contains_key(&u.task)) {
            return Err(BoardError::UnknownTask(missing.task));
        }
        for update in updates {
            if let Some(record) = records.get_mut(&update.task) {
                record.positions.insert(user.to_string(), update.position);
            }
        }
        Ok(())
    }

    /// Returns the number of tasks in the table.
    pub async fn task_count(&self) -> usize {
        let records = self.records.read().await;
        records.len()
    }

    /// Fills the table with a small demo board for trying the client out.
    ///
    /// Returns the number of tasks inserted.
    pub async fn seed_demo(&self) -> usize {
        let tasks = demo_tasks();
        let count = tasks.len();
        for task in tasks {
            self.insert(task).await;
        }
        count
    }
}

/// Milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or(u64::MAX)
}

/// A small demo board spread across the lanes.
#[must_use]
pub fn demo_tasks() -> Vec<Task> {
    let base = now_ms();
    let day = 24 * 60 * 60 * 1000;
    let mk = |offset: u64,
              title: &str,
              status: TaskStatus,
              priority: TaskPriority,
              kind: TaskKind,
              assignee: &str| Task {
        id: TaskId::new(),
        title: title.to_string(),
        description: String::new(),
        status,
        priority,
        kind,
        project: Some("website".to_string()),
        assignees: vec![assignee.to_string()],
        reviewers: vec![],
        due_ms: Some(base + (offset + 3) * day),
        position: None,
        created_ms: base + offset,
    };

    vec![
        mk(
            0,
            "Draft landing page copy",
            TaskStatus::Backlog,
            TaskPriority::Medium,
            TaskKind::Feature,
            "alice",
        ),
        mk(
            1,
            "Fix broken signup redirect",
            TaskStatus::Backlog,
            TaskPriority::Urgent,
            TaskKind::Bug,
            "bob",
        ),
        mk(
            2,
            "Migrate image assets to CDN",
            TaskStatus::InProgress,
            TaskPriority::High,
            TaskKind::Chore,
            "alice",
        ),
        mk(
            3,
            "Evaluate analytics vendors",
            TaskStatus::InProgress,
            TaskPriority::Low,
            TaskKind::Research,
            "carol",
        ),
        mk(
            4,
            "Rework pricing table",
            TaskStatus::WaitingReview,
            TaskPriority::High,
            TaskKind::Feature,
            "bob",
        ),
        mk(
            5,
            "Client onboarding deck",
            TaskStatus::SentClient,
            TaskPriority::Medium,
            TaskKind::Feature,
            "carol",
        ),
        mk(
            6,
            "Adjust header contrast",
            TaskStatus::Feedback,
            TaskPriority::Low,
            TaskKind::Bug,
            "alice",
        ),
        mk(
            7,
            "Q3 retainer proposal",
            TaskStatus::Approved,
            TaskPriority::Medium,
            TaskKind::Chore,
            "bob",
        ),
        mk(
            8,
            "Launch checklist walkthrough",
            TaskStatus::Done,
            TaskPriority::High,
            TaskKind::Feature,
            "carol",
        ),
    ]
}
