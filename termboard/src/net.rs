//! Sync coordinator for wiring the TUI to the async gateway layer.
//!
//! This module bridges the synchronous TUI event loop (crossterm
//! poll-based) with the async [`StatusGateway`] stack. It spawns a
//! background tokio task and communicates with the main thread via
//! [`SyncCommand`] / [`SyncEvent`] channels.
//!
//! # Architecture
//!
//! ```text
//! TUI (main thread)  ←── SyncEvent ───  tokio background tasks
//!                     ─── SyncCommand →
//! ```
//!
//! The main thread sends [`SyncCommand`]s (e.g., report a card's new
//! status) and drains [`SyncEvent`]s (e.g., update resolved, board
//! snapshot arrived) on each tick of the poll-based event loop.
//!
//! Each command resolves in its own spawned task, so a slow status
//! POST never delays a later one: two drags of the same card can be
//! in flight at once, and the drag controller sorts out which result
//! still matters by generation.

use std::sync::Arc;

use tokio::sync::mpsc;

use termboard_proto::task::{Task, TaskId, TaskStatus};
use termboard_proto::wire::CreateTaskRequest;

use crate::board::drag::DropOutcome;
use crate::sync::StatusGateway;

/// Commands sent from the TUI main loop to the sync background task.
#[derive(Debug)]
pub enum SyncCommand {
    /// Contact the server so it issues session credentials.
    OpenSession,
    /// Fetch a fresh board snapshot.
    RefreshBoard,
    /// Report a card relocation to the server.
    UpdateStatus {
        /// Drop generation, echoed back in [`SyncEvent::UpdateResolved`].
        generation: u64,
        /// The relocated card.
        task_id: TaskId,
        /// The column it now sits in.
        status: TaskStatus,
    },
    /// Create a task on the server.
    CreateTask(CreateTaskRequest),
    /// Delete a task on the server.
    DeleteTask(TaskId),
    /// Gracefully shut down the sync task.
    Shutdown,
}

/// Events sent from the sync background task to the TUI main loop.
#[derive(Debug)]
pub enum SyncEvent {
    /// Session bootstrap finished; credentials are held for later
    /// mutating calls.
    SessionOpened,
    /// Session bootstrap failed. The board stays usable offline.
    SessionFailed {
        /// Human-readable failure description.
        detail: String,
    },
    /// A full board snapshot arrived.
    BoardFetched(Vec<Task>),
    /// The server stored a new task; this is the stored record.
    TaskCreated(Task),
    /// A status update resolved. Feed the outcome to the drag
    /// controller, which decides whether to roll back.
    UpdateResolved {
        /// The generation from the originating [`SyncCommand::UpdateStatus`].
        generation: u64,
        /// The card the update was for.
        task_id: TaskId,
        /// How the server answered.
        outcome: DropOutcome,
    },
    /// A delete resolved. `error` carries the alert text on failure.
    DeleteResolved {
        /// The card the delete was for.
        task_id: TaskId,
        /// `None` on success; the failure description otherwise.
        error: Option<String>,
    },
    /// A non-drag request failed (refresh, create).
    Error(String),
}

/// Default channel capacity for commands and events.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Spawn the sync background task and return channel handles.
///
/// The task listens for [`SyncCommand`]s and resolves each against the
/// gateway in its own spawned task, sending the result back as a
/// [`SyncEvent`]. [`SyncCommand::Shutdown`] stops the listener; events
/// from requests already in flight still drain before the event
/// channel closes.
pub fn spawn_sync<G>(
    gateway: Arc<G>,
    capacity: usize,
) -> (mpsc::Sender<SyncCommand>, mpsc::Receiver<SyncEvent>)
where
    G: StatusGateway + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<SyncCommand>(capacity);
    let (evt_tx, evt_rx) = mpsc::channel::<SyncEvent>(capacity);

    tokio::spawn(async move {
        command_loop(gateway, cmd_rx, evt_tx).await;
    });

    (cmd_tx, evt_rx)
}

/// Background task: handle commands from the TUI main loop.
///
/// Every command except `Shutdown` is resolved concurrently so that
/// one stalled request cannot head-of-line block the rest.
async fn command_loop<G>(
    gateway: Arc<G>,
    mut cmd_rx: mpsc::Receiver<SyncCommand>,
    evt_tx: mpsc::Sender<SyncEvent>,
) where
    G: StatusGateway + 'static,
{
    while let Some(cmd) = cmd_rx.recv().await {
        if matches!(cmd, SyncCommand::Shutdown) {
            tracing::info!("sync worker shutting down");
            break;
        }
        let gateway = Arc::clone(&gateway);
        let evt_tx = evt_tx.clone();
        tokio::spawn(async move {
            if let Some(event) = resolve_command(gateway.as_ref(), cmd).await {
                let _ = evt_tx.send(event).await;
            }
        });
    }
}

/// Resolves one command against the gateway into the event the TUI
/// consumes. Failed status updates are not logged here: the drag
/// controller owns the diagnostic when it rolls the card back.
async fn resolve_command<G: StatusGateway>(gateway: &G, command: SyncCommand) -> Option<SyncEvent> {
    let event = match command {
        SyncCommand::OpenSession => match gateway.open_session().await {
            Ok(()) => SyncEvent::SessionOpened,
            Err(e) => {
                tracing::warn!(error = %e, "session bootstrap failed");
                SyncEvent::SessionFailed {
                    detail: e.to_string(),
                }
            }
        },
        SyncCommand::RefreshBoard => match gateway.fetch_board().await {
            Ok(tasks) => SyncEvent::BoardFetched(tasks),
            Err(e) => {
                tracing::warn!(error = %e, "board refresh failed");
                SyncEvent::Error(format!("Refresh failed: {e}"))
            }
        },
        SyncCommand::UpdateStatus {
            generation,
            task_id,
            status,
        } => {
            let outcome = match gateway.update_status(task_id, status).await {
                Ok(()) => DropOutcome::Confirmed,
                Err(e) => e.to_outcome(),
            };
            SyncEvent::UpdateResolved {
                generation,
                task_id,
                outcome,
            }
        }
        SyncCommand::CreateTask(draft) => match gateway.create_task(draft).await {
            Ok(task) => SyncEvent::TaskCreated(task),
            Err(e) => {
                tracing::warn!(error = %e, "task creation failed");
                SyncEvent::Error(format!("Create failed: {e}"))
            }
        },
        SyncCommand::DeleteTask(task_id) => match gateway.delete_task(task_id).await {
            Ok(()) => SyncEvent::DeleteResolved {
                task_id,
                error: None,
            },
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "delete failed");
                SyncEvent::DeleteResolved {
                    task_id,
                    error: Some(e.to_string()),
                }
            }
        },
        // Handled by the command loop before dispatch.
        SyncCommand::Shutdown => return None,
    };
    Some(event)
}
