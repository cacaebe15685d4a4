//! Task domain types shared by the `TaskDeck` client and hub.
//!
//! Defines the task record, the fixed set of board statuses, and the
//! position-update pair used by batch reorder writes. Positions are
//! per-user ordering keys, meaningful only relative to other tasks of
//! the same user and status.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a task. Each status is one lane on the board.
///
/// The variant order in [`TaskStatus::ALL`] is the board's lane order
/// and must not change: clients render lanes and classify drags by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not scheduled yet.
    Backlog,
    /// Actively being worked on.
    InProgress,
    /// Finished work awaiting internal review.
    WaitingReview,
    /// Delivered to the client for sign-off.
    SentClient,
    /// Client sent change requests.
    Feedback,
    /// Approved by the client.
    Approved,
    /// Fully done and archived on the board.
    Done,
}

impl TaskStatus {
    /// All statuses in board lane order.
    pub const ALL: [Self; 7] = [
        Self::Backlog,
        Self::InProgress,
        Self::WaitingReview,
        Self::SentClient,
        Self::Feedback,
        Self::Approved,
        Self::Done,
    ];

    /// Human-readable lane title for the board header.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::InProgress => "In Progress",
            Self::WaitingReview => "Waiting Review",
            Self::SentClient => "Sent to Client",
            Self::Feedback => "Feedback",
            Self::Approved => "Approved",
            Self::Done => "Done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backlog => write!(f, "backlog"),
            Self::InProgress => write!(f, "in_progress"),
            Self::WaitingReview => write!(f, "waiting_review"),
            Self::SentClient => write!(f, "sent_client"),
            Self::Feedback => write!(f, "feedback"),
            Self::Approved => write!(f, "approved"),
            Self::Done => write!(f, "done"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(Self::Backlog),
            "in_progress" => Ok(Self::InProgress),
            "waiting_review" => Ok(Self::WaitingReview),
            "sent_client" => Ok(Self::SentClient),
            "feedback" => Ok(Self::Feedback),
            "approved" => Ok(Self::Approved),
            "done" => Ok(Self::Done),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// Priority of a task, shown as a marker on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPriority {
    /// Can wait.
    Low,
    /// Normal scheduling.
    Medium,
    /// Should be picked up soon.
    High,
    /// Drop everything.
    Urgent,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Urgent => write!(f, "urgent"),
        }
    }
}

/// Category of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    /// New functionality.
    Feature,
    /// Something is broken.
    Bug,
    /// Maintenance or cleanup.
    Chore,
    /// Investigation with no direct deliverable.
    Research,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Feature => write!(f, "feature"),
            Self::Bug => write!(f, "bug"),
            Self::Chore => write!(f, "chore"),
            Self::Research => write!(f, "research"),
        }
    }
}

/// A task record as seen by one user.
///
/// `position` is the viewing user's ordering key within the task's
/// current status lane. `None` means the user never reordered this
/// task; such tasks sort after positioned ones in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier (UUID v7, time-ordered).
    pub id: TaskId,
    /// Short title shown on the card.
    pub title: String,
    /// Longer free-form description.
    pub description: String,
    /// Which board lane the task is in. Exactly one at a time.
    pub status: TaskStatus,
    /// Scheduling priority.
    pub priority: TaskPriority,
    /// Category of work.
    pub kind: TaskKind,
    /// Project this task belongs to, if any.
    pub project: Option<String>,
    /// Users responsible for the work.
    pub assignees: Vec<String>,
    /// Users who review the work.
    pub reviewers: Vec<String>,
    /// Due date in milliseconds since epoch, if set.
    pub due_ms: Option<u64>,
    /// The viewing user's ordering key within the status lane.
    pub position: Option<u32>,
    /// When this task was created (milliseconds since epoch).
    pub created_ms: u64,
}

/// One entry of a batch position write: the task and its new ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    /// The task whose position changes.
    pub task: TaskId,
    /// The new ordering key for the viewing user.
    pub position: u32,
}
