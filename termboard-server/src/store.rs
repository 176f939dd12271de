//! In-memory task registry backing the HTTP API.
//!
//! The [`TaskStore`] owns every task record, hands out ids, and is the
//! single authority on what a board refresh returns. Clients render
//! moves optimistically; this store is what they reconcile against
//! when an update fails.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use tokio::sync::RwLock;

use termboard_proto::task::{Priority, Task, TaskId, TaskStatus, now_millis};

/// Default maximum number of stored tasks before creation is refused.
const DEFAULT_MAX_TASKS: usize = 10_000;

/// Thread-safe in-memory task registry with id assignment.
pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
    next_id: AtomicU64,
    max_tasks: usize,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// Creates an empty store with the default task cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_tasks(DEFAULT_MAX_TASKS)
    }

    /// Creates an empty store with a custom task cap.
    #[must_use]
    pub fn with_max_tasks(max_tasks: usize) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            max_tasks,
        }
    }

    /// Inserts existing task records, keeping id assignment above the
    /// highest seeded id.
    pub async fn seed(&self, tasks: Vec<Task>) {
        let mut map = self.tasks.write().await;
        for task in tasks {
            let floor = task.id.as_u64() + 1;
            if self.next_id.load(Ordering::Relaxed) < floor {
                self.next_id.store(floor, Ordering::Relaxed);
            }
            map.insert(task.id, task);
        }
    }

    /// All tasks in stable order (ascending id).
    pub async fn list(&self) -> Vec<Task> {
        let map = self.tasks.read().await;
        let mut tasks: Vec<Task> = map.values().cloned().collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    /// Looks up one task.
    pub async fn get(&self, id: TaskId) -> Option<Task> {
        let map = self.tasks.read().await;
        map.get(&id).cloned()
    }

    /// Creates a task, assigning the next id. Returns `None` when the
    /// store is at capacity.
    pub async fn create(
        &self,
        title: String,
        status: TaskStatus,
        priority: Priority,
        deadline: Option<NaiveDate>,
    ) -> Option<Task> {
        let mut map = self.tasks.write().await;
        if map.len() >= self.max_tasks {
            return None;
        }
        let task = Task {
            id: TaskId::new(self.next_id.fetch_add(1, Ordering::Relaxed)),
            title,
            status,
            priority,
            deadline,
            created_at: now_millis(),
        };
        map.insert(task.id, task.clone());
        Some(task)
    }

    /// Moves a task to a new status. Returns `false` when the id is
    /// unknown.
    pub async fn set_status(&self, id: TaskId, status: TaskStatus) -> bool {
        let mut map = self.tasks.write().await;
        match map.get_mut(&id) {
            Some(task) => {
                task.status = status;
                true
            }
            None => false,
        }
    }

    /// Removes a task. Returns `false` when the id is unknown.
    pub async fn delete(&self, id: TaskId) -> bool {
        let mut map = self.tasks.write().await;
        map.remove(&id).is_some()
    }

    /// Number of stored tasks.
    pub async fn len(&self) -> usize {
        let map = self.tasks.read().await;
        map.len()
    }

    /// Whether the store holds no tasks.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
