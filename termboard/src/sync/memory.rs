//! In-process gateway backed by a plain `Vec` of tasks.
//!
//! Fills the role a loopback transport does for a network stack: the
//! full client path (controller, sync worker, app) runs against it
//! without a server. Failures are injected per call, so tests can
//! script "the next update returns a 500" and watch the rollback.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use termboard_proto::task::{Task, TaskId, TaskStatus, now_millis, validate_title};
use termboard_proto::wire::CreateTaskRequest;

use super::{StatusGateway, SyncError};

/// [`StatusGateway`] over in-process state, with scriptable failures.
pub struct InMemoryGateway {
    tasks: Mutex<Vec<Task>>,
    next_id: AtomicU64,
    fail_updates: Mutex<VecDeque<SyncError>>,
    fail_deletes: Mutex<VecDeque<SyncError>>,
    updates: Mutex<Vec<(TaskId, TaskStatus)>>,
    deletes: Mutex<Vec<TaskId>>,
    sessions: AtomicUsize,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            fail_updates: Mutex::new(VecDeque::new()),
            fail_deletes: Mutex::new(VecDeque::new()),
            updates: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            sessions: AtomicUsize::new(0),
        }
    }
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway pre-seeded with `tasks`. Later created tasks
    /// get ids above the highest seeded one.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next = tasks.iter().map(|t| t.id.as_u64() + 1).max().unwrap_or(1);
        Self {
            tasks: Mutex::new(tasks),
            next_id: AtomicU64::new(next),
            ..Self::default()
        }
    }

    /// Scripts the next `update_status` call to fail with `error`.
    /// Queued failures are consumed in order; once the queue is empty,
    /// calls succeed again.
    pub fn fail_next_update(&self, error: SyncError) {
        self.fail_updates.lock().push_back(error);
    }

    /// Scripts the next `delete_task` call to fail with `error`.
    pub fn fail_next_delete(&self, error: SyncError) {
        self.fail_deletes.lock().push_back(error);
    }

    /// Every `update_status` call seen so far, failures included.
    #[must_use]
    pub fn recorded_updates(&self) -> Vec<(TaskId, TaskStatus)> {
        self.updates.lock().clone()
    }

    /// Every `delete_task` call seen so far, failures included.
    #[must_use]
    pub fn recorded_deletes(&self) -> Vec<TaskId> {
        self.deletes.lock().clone()
    }

    #[must_use]
    pub fn sessions_opened(&self) -> usize {
        self.sessions.load(Ordering::Relaxed)
    }

    /// Current server-side view of the tasks.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.lock().clone()
    }
}

impl StatusGateway for InMemoryGateway {
    async fn open_session(&self) -> Result<(), SyncError> {
        self.sessions.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn fetch_board(&self) -> Result<Vec<Task>, SyncError> {
        Ok(self.snapshot())
    }

    async fn update_status(&self, task_id: TaskId, status: TaskStatus) -> Result<(), SyncError> {
        self.updates.lock().push((task_id, status));
        if let Some(error) = self.fail_updates.lock().pop_front() {
            return Err(error);
        }
        let mut tasks = self.tasks.lock();
        match tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => {
                task.status = status;
                Ok(())
            }
            None => Err(SyncError::Rejected {
                detail: "unknown task".to_string(),
            }),
        }
    }

    async fn create_task(&self, draft: CreateTaskRequest) -> Result<Task, SyncError> {
        validate_title(&draft.title).map_err(|e| SyncError::Rejected {
            detail: e.to_string(),
        })?;
        let task = Task {
            id: TaskId::new(self.next_id.fetch_add(1, Ordering::Relaxed)),
            title: draft.title,
            status: draft.status.unwrap_or(TaskStatus::Draft),
            priority: draft.priority.unwrap_or_default(),
            deadline: draft.deadline,
            created_at: now_millis(),
        };
        self.tasks.lock().push(task.clone());
        Ok(task)
    }

    async fn delete_task(&self, task_id: TaskId) -> Result<(), SyncError> {
        self.deletes.lock().push(task_id);
        if let Some(error) = self.fail_deletes.lock().pop_front() {
            return Err(error);
        }
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);
        if tasks.len() == before {
            return Err(SyncError::Rejected {
                detail: "unknown task".to_string(),
            });
        }
        Ok(())
    }
}
