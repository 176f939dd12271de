//! Wire payloads for the `TermBoard` HTTP exchange.
//!
//! Mutating requests travel as `application/x-www-form-urlencoded`
//! bodies and answer with a JSON `{"success": …}` envelope; the board
//! snapshot is a JSON array of [`Task`](crate::task::Task) records.
//! The CSRF token is issued as a cookie and echoed back in a header
//! (double-submit).

use serde::{Deserialize, Serialize};

use crate::task::{Priority, TaskId, TaskStatus};

/// Header carrying the CSRF token on mutating requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Cookie under which the server issues the CSRF token.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Form body of the status-update request: `task_id=<id>&status=<column>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    /// Which task to move.
    pub task_id: TaskId,
    /// The status of the column it was dropped into.
    pub status: TaskStatus,
}

/// JSON reply to mutating requests.
///
/// `success: true` is the only shape the client treats as confirmation;
/// anything else (including a missing or false `success`) is a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    /// Whether the server applied the change.
    pub success: bool,
    /// Human-readable rejection detail, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UpdateResponse {
    /// A plain success reply.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A rejection reply with detail.
    #[must_use]
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Form body of the task-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Title for the new task.
    pub title: String,
    /// Starting column; defaults to `draft` when omitted.
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Display priority; defaults to `medium` when omitted.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Optional due date (`YYYY-MM-DD`).
    #[serde(default)]
    pub deadline: Option<chrono::NaiveDate>,
}

/// JSON reply to a task-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    /// Whether the task was created.
    pub success: bool,
    /// The created task record, present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<crate::task::Task>,
    /// Rejection detail, present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Form body of the task-deletion request: `task_id=<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTaskRequest {
    /// Which task to delete.
    pub task_id: TaskId,
}
