//! Drag relocation controller: optimistic card moves with rollback.
//!
//! A drag gesture becomes an explicit [`DragSession`] owned by the
//! [`DragController`]. Dropping a card applies the move to the board
//! immediately and hands the caller a [`StatusUpdate`] to dispatch to
//! the server; the eventual resolution comes back through
//! [`DragController::complete_drop`], which either lets the move stand
//! or restores the card to its exact prior position and reports the
//! failure for a blocking alert.
//!
//! Each dispatched drop carries a generation stamp and owns its own
//! rollback snapshot, so starting a new drag while an update is still
//! in flight can neither corrupt the pending drop's rollback data nor
//! be clobbered by it: a failure resolution only rolls back when its
//! generation is still the newest drop for that card.

use std::collections::HashMap;

use termboard_proto::task::{TaskId, TaskStatus};

use super::model::Board;

/// Where a card sat before a drop, for exact-position restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorPosition {
    /// Column the card came from.
    pub column: TaskStatus,
    /// The card that was immediately after it, if any. Restore inserts
    /// before this card when it is still in the prior column, and
    /// appends to the column's end otherwise.
    pub successor: Option<TaskId>,
}

/// Transient record of the card being dragged and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    /// The card being moved.
    pub task_id: TaskId,
    /// Its position when the drag started.
    pub origin: PriorPosition,
}

/// Interaction phase of the controller, for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    /// No drag in progress, nothing awaiting the server.
    Idle,
    /// A card is picked up.
    Dragging,
    /// One or more drops await server confirmation.
    ResolvingDrop,
}

/// Server resolution of a dispatched status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// HTTP 2xx and the body reported `success: true`.
    Confirmed,
    /// HTTP 2xx but the body reported `success: false`.
    Rejected {
        /// Server-supplied detail, if any.
        detail: String,
    },
    /// Non-2xx HTTP status.
    HttpError {
        /// The HTTP status code.
        status: u16,
        /// Response body, for the diagnostic log.
        body: String,
    },
    /// The request never completed.
    NetworkError {
        /// Transport-level detail.
        detail: String,
    },
}

/// Update descriptor returned by a drop, for the caller to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Generation stamp identifying this drop.
    pub generation: u64,
    /// Which task to update.
    pub task_id: TaskId,
    /// The status of the column it was dropped into.
    pub status: TaskStatus,
}

/// A failed relocation, surfaced to the user as a blocking alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropFailure {
    /// The card whose move failed.
    pub task_id: TaskId,
    /// Alert text for the user.
    pub message: String,
}

/// A drop dispatched to the server, awaiting its resolution.
#[derive(Debug, Clone, Copy)]
struct PendingDrop {
    task_id: TaskId,
    target: TaskStatus,
    origin: PriorPosition,
}

/// Mediates card moves between columns with optimistic update and
/// exact-position rollback.
#[derive(Debug, Default)]
pub struct DragController {
    /// The active drag session; at most one exists at any time.
    session: Option<DragSession>,
    /// Column currently highlighted as a drop target.
    hover: Option<TaskStatus>,
    /// In-flight drops keyed by generation.
    pending: HashMap<u64, PendingDrop>,
    /// Newest drop generation per card, for staleness detection.
    latest: HashMap<TaskId, u64>,
    next_generation: u64,
}

impl DragController {
    /// Creates an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current interaction phase. An active drag takes precedence over
    /// pending resolutions in the report.
    #[must_use]
    pub fn phase(&self) -> DragPhase {
        if self.session.is_some() {
            DragPhase::Dragging
        } else if self.pending.is_empty() {
            DragPhase::Idle
        } else {
            DragPhase::ResolvingDrop
        }
    }

    /// The active drag session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// The card currently being dragged, for the display affordance.
    #[must_use]
    pub fn dragged_card(&self) -> Option<TaskId> {
        self.session.map(|s| s.task_id)
    }

    /// The column currently highlighted as a drop target.
    #[must_use]
    pub const fn hover_target(&self) -> Option<TaskStatus> {
        self.hover
    }

    /// Whether a card has a status update still awaiting the server.
    #[must_use]
    pub fn has_pending(&self, task_id: TaskId) -> bool {
        self.latest.contains_key(&task_id)
    }

    /// Number of drops awaiting resolution.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Starts a drag, recording the card's current column and next
    /// sibling for rollback.
    ///
    /// Unconditionally replaces any previous session: last drag wins.
    /// Unknown ids are ignored.
    pub fn begin_drag(&mut self, board: &Board, task_id: TaskId) {
        let Some(location) = board.locate(task_id) else {
            tracing::debug!(task_id = %task_id, "drag begun on unknown card, ignoring");
            return;
        };
        self.session = Some(DragSession {
            task_id,
            origin: PriorPosition {
                column: location.column,
                successor: board.successor_of(task_id),
            },
        });
        tracing::debug!(
            task_id = %task_id,
            column = %location.column,
            "drag session started"
        );
    }

    /// Ends the drag gesture: clears the dragging affordance and
    /// discards the session, whether or not a drop occurred.
    pub fn end_drag(&mut self) {
        self.session = None;
        self.hover = None;
    }

    /// Marks a column as the hovered drop target while a drag is in
    /// progress. Display affordance only.
    pub const fn drag_over(&mut self, column: TaskStatus) {
        if self.session.is_some() {
            self.hover = Some(column);
        }
    }

    /// Clears the drop-target highlight.
    pub const fn drag_leave(&mut self) {
        self.hover = None;
    }

    /// Handles a drop on a column: resolves the card, applies the move
    /// optimistically, and returns the update for the caller to
    /// dispatch.
    ///
    /// Resolution prefers the active session's card; `payload` is the
    /// fallback identifier carried by the drop gesture itself. If
    /// neither resolves to a card on the board, nothing happens and
    /// `None` is returned. The session is consumed on every path.
    pub fn handle_drop(
        &mut self,
        board: &mut Board,
        target: TaskStatus,
        payload: Option<TaskId>,
    ) -> Option<StatusUpdate> {
        self.hover = None;
        let session = self.session.take();

        let (task_id, origin) = match session {
            Some(s) if board.contains(s.task_id) => (s.task_id, s.origin),
            _ => {
                // No usable session: fall back to the payload id and
                // snapshot the card's position at drop time so a
                // failure can still restore it exactly.
                let id = payload.filter(|id| board.contains(*id))?;
                let location = board.locate(id)?;
                (
                    id,
                    PriorPosition {
                        column: location.column,
                        successor: board.successor_of(id),
                    },
                )
            }
        };

        board.move_to_column_end(task_id, target);

        self.next_generation += 1;
        let generation = self.next_generation;
        self.pending.insert(
            generation,
            PendingDrop {
                task_id,
                target,
                origin,
            },
        );
        self.latest.insert(task_id, generation);

        tracing::debug!(
            task_id = %task_id,
            from = %origin.column,
            to = %target,
            generation,
            "card moved optimistically, dispatching status update"
        );

        Some(StatusUpdate {
            generation,
            task_id,
            status: target,
        })
    }

    /// Applies the server's resolution of a dispatched drop.
    ///
    /// On confirmation the optimistic move stands. On failure the card
    /// is restored to its exact prior position (before its recorded
    /// successor when that card is still in the prior column, appended
    /// otherwise) and a [`DropFailure`] is returned for the alert —
    /// unless a newer drop of the same card has since been dispatched,
    /// in which case the stale resolution only clears its bookkeeping.
    /// The rollback bookkeeping for this generation is removed on every
    /// path.
    pub fn complete_drop(
        &mut self,
        board: &mut Board,
        generation: u64,
        outcome: &DropOutcome,
    ) -> Option<DropFailure> {
        let Some(drop) = self.pending.remove(&generation) else {
            tracing::debug!(generation, "resolution for unknown drop generation");
            return None;
        };

        let is_latest = self.latest.get(&drop.task_id) == Some(&generation);
        if is_latest {
            self.latest.remove(&drop.task_id);
        }

        match outcome {
            DropOutcome::Confirmed => {
                tracing::debug!(
                    task_id = %drop.task_id,
                    status = %drop.target,
                    generation,
                    "status update confirmed"
                );
                None
            }
            DropOutcome::Rejected { detail } => {
                tracing::error!(
                    task_id = %drop.task_id,
                    status = %drop.target,
                    detail = %detail,
                    "server rejected the status update"
                );
                self.rollback(board, &drop, is_latest, generation);
                is_latest.then(|| DropFailure {
                    task_id: drop.task_id,
                    message: "The server rejected the status update.".to_string(),
                })
            }
            DropOutcome::HttpError { status, body } => {
                tracing::error!(
                    task_id = %drop.task_id,
                    http_status = status,
                    body = %body,
                    "status update failed"
                );
                self.rollback(board, &drop, is_latest, generation);
                is_latest.then(|| DropFailure {
                    task_id: drop.task_id,
                    message: "Failed to update task status (see log).".to_string(),
                })
            }
            DropOutcome::NetworkError { detail } => {
                tracing::error!(
                    task_id = %drop.task_id,
                    detail = %detail,
                    "network error during status update"
                );
                self.rollback(board, &drop, is_latest, generation);
                is_latest.then(|| DropFailure {
                    task_id: drop.task_id,
                    message: "Network error while updating task status.".to_string(),
                })
            }
        }
    }

    /// Restores the card to its prior position, unless the resolution
    /// is stale or the card has left the board since.
    fn rollback(&self, board: &mut Board, drop: &PendingDrop, is_latest: bool, generation: u64) {
        if !is_latest {
            tracing::debug!(
                task_id = %drop.task_id,
                generation,
                "stale drop resolution, board left untouched"
            );
            return;
        }
        let Some(task) = board.remove_card(drop.task_id) else {
            tracing::warn!(
                task_id = %drop.task_id,
                "card no longer on the board, nothing to restore"
            );
            return;
        };
        let index = drop
            .origin
            .successor
            .and_then(|succ| board.index_of(drop.origin.column, succ));
        match index {
            Some(i) => board.insert_card(drop.origin.column, i, task),
            None => board.append_card(drop.origin.column, task),
        }
    }
}
