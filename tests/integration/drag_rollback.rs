//! Integration tests for the drag relocation flow.
//!
//! Drives the full client stack: [`DragController`] + board +
//! [`termboard::net::spawn_sync`] worker + [`InMemoryGateway`], the
//! same wiring the TUI main loop uses. These tests validate:
//! - A confirmed drop leaves the optimistic move in place
//! - A failed drop restores the card to its exact prior position and
//!   raises exactly one blocking alert
//! - A resolution that arrives after a newer drag of the same card is
//!   discarded (last drag wins)
//! - Key-driven drag, delete, and create flows against the worker

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use termboard::app::{App, Mode};
use termboard::board::drag::{DragController, DropOutcome};
use termboard::board::model::Board;
use termboard::net::{self, SyncCommand, SyncEvent};
use termboard::sync::SyncError;
use termboard::sync::memory::InMemoryGateway;
use termboard_proto::task::{Priority, Task, TaskId, TaskStatus};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn make_task(id: u64, status: TaskStatus) -> Task {
    Task {
        id: TaskId::new(id),
        title: format!("task {id}"),
        status,
        priority: Priority::Medium,
        deadline: None,
        created_at: 0,
    }
}

/// Cards 5, 7, 9 in draft and 4 in in_progress.
fn seed_tasks() -> Vec<Task> {
    vec![
        make_task(5, TaskStatus::Draft),
        make_task(7, TaskStatus::Draft),
        make_task(9, TaskStatus::Draft),
        make_task(4, TaskStatus::InProgress),
    ]
}

fn column_ids(board: &Board, status: TaskStatus) -> Vec<u64> {
    board
        .column(status)
        .cards
        .iter()
        .map(|t| t.id.as_u64())
        .collect()
}

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

/// Receives the next sync event or panics after a timeout.
async fn recv_event(rx: &mut mpsc::Receiver<SyncEvent>) -> SyncEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for sync event")
        .expect("event channel closed unexpectedly")
}

/// Receives the next event and unwraps it as an update resolution.
async fn recv_update(rx: &mut mpsc::Receiver<SyncEvent>) -> (u64, DropOutcome) {
    match recv_event(rx).await {
        SyncEvent::UpdateResolved {
            generation,
            outcome,
            ..
        } => (generation, outcome),
        other => panic!("expected UpdateResolved, got: {other:?}"),
    }
}

// ===========================================================================
// Optimistic move + server confirmation
// ===========================================================================

#[tokio::test]
async fn confirmed_drop_keeps_the_optimistic_move() {
    let gateway = Arc::new(InMemoryGateway::with_tasks(seed_tasks()));
    let (cmd_tx, mut evt_rx) = net::spawn_sync(Arc::clone(&gateway), 8);

    let mut board = Board::from_tasks(seed_tasks());
    let mut ctl = DragController::new();

    ctl.begin_drag(&board, TaskId::new(7));
    let update = ctl
        .handle_drop(&mut board, TaskStatus::Completed, None)
        .unwrap();

    // The move shows immediately, before the server answers.
    assert_eq!(column_ids(&board, TaskStatus::Draft), vec![5, 9]);
    assert_eq!(column_ids(&board, TaskStatus::Completed), vec![7]);

    cmd_tx
        .send(SyncCommand::UpdateStatus {
            generation: update.generation,
            task_id: update.task_id,
            status: update.status,
        })
        .await
        .unwrap();

    let (generation, outcome) = recv_update(&mut evt_rx).await;
    assert_eq!(generation, update.generation);
    assert_eq!(outcome, DropOutcome::Confirmed);

    let failure = ctl.complete_drop(&mut board, generation, &outcome);
    assert!(failure.is_none());
    assert_eq!(column_ids(&board, TaskStatus::Completed), vec![7]);
    assert_eq!(ctl.pending_count(), 0);

    // The server really moved it.
    assert_eq!(
        gateway.recorded_updates(),
        vec![(TaskId::new(7), TaskStatus::Completed)]
    );
}

// ===========================================================================
// Rollback on failure
// ===========================================================================

#[tokio::test]
async fn server_error_rolls_back_to_exact_position() {
    let gateway = Arc::new(InMemoryGateway::with_tasks(seed_tasks()));
    gateway.fail_next_update(SyncError::HttpStatus {
        status: 500,
        body: "internal error".to_string(),
    });
    let (cmd_tx, mut evt_rx) = net::spawn_sync(Arc::clone(&gateway), 8);

    let mut board = Board::from_tasks(seed_tasks());
    let mut ctl = DragController::new();

    // Card 7 sits between 5 and 9.
    ctl.begin_drag(&board, TaskId::new(7));
    let update = ctl
        .handle_drop(&mut board, TaskStatus::Completed, None)
        .unwrap();

    cmd_tx
        .send(SyncCommand::UpdateStatus {
            generation: update.generation,
            task_id: update.task_id,
            status: update.status,
        })
        .await
        .unwrap();

    let (generation, outcome) = recv_update(&mut evt_rx).await;
    assert_eq!(
        outcome,
        DropOutcome::HttpError {
            status: 500,
            body: "internal error".to_string()
        }
    );

    let failure = ctl.complete_drop(&mut board, generation, &outcome).unwrap();
    assert_eq!(failure.task_id, TaskId::new(7));
    assert_eq!(failure.message, "Failed to update task status (see log).");

    // Back in its exact slot, not at the column end.
    assert_eq!(column_ids(&board, TaskStatus::Draft), vec![5, 7, 9]);
    assert!(board.column(TaskStatus::Completed).is_empty());
    assert_eq!(ctl.pending_count(), 0);

    // The server still stores the original status.
    assert_eq!(
        gateway.snapshot()[1].status,
        TaskStatus::Draft,
        "server state must be untouched by the failed update"
    );
}

#[tokio::test]
async fn network_failure_reverts_the_move() {
    let gateway = Arc::new(InMemoryGateway::with_tasks(seed_tasks()));
    gateway.fail_next_update(SyncError::Network {
        detail: "connection refused".to_string(),
    });
    let (cmd_tx, mut evt_rx) = net::spawn_sync(gateway, 8);

    let mut board = Board::from_tasks(seed_tasks());
    let mut ctl = DragController::new();

    ctl.begin_drag(&board, TaskId::new(9));
    let update = ctl
        .handle_drop(&mut board, TaskStatus::Archived, None)
        .unwrap();

    cmd_tx
        .send(SyncCommand::UpdateStatus {
            generation: update.generation,
            task_id: update.task_id,
            status: update.status,
        })
        .await
        .unwrap();

    let (generation, outcome) = recv_update(&mut evt_rx).await;
    let failure = ctl.complete_drop(&mut board, generation, &outcome).unwrap();

    assert_eq!(failure.message, "Network error while updating task status.");
    assert_eq!(column_ids(&board, TaskStatus::Draft), vec![5, 7, 9]);
    assert!(board.column(TaskStatus::Archived).is_empty());
}

#[tokio::test]
async fn rejection_reverts_and_reports() {
    let gateway = Arc::new(InMemoryGateway::with_tasks(seed_tasks()));
    gateway.fail_next_update(SyncError::Rejected {
        detail: "archived tasks are frozen".to_string(),
    });
    let (cmd_tx, mut evt_rx) = net::spawn_sync(gateway, 8);

    let mut board = Board::from_tasks(seed_tasks());
    let mut ctl = DragController::new();

    ctl.begin_drag(&board, TaskId::new(5));
    let update = ctl
        .handle_drop(&mut board, TaskStatus::InProgress, None)
        .unwrap();

    cmd_tx
        .send(SyncCommand::UpdateStatus {
            generation: update.generation,
            task_id: update.task_id,
            status: update.status,
        })
        .await
        .unwrap();

    let (generation, outcome) = recv_update(&mut evt_rx).await;
    let failure = ctl.complete_drop(&mut board, generation, &outcome).unwrap();

    assert_eq!(failure.message, "The server rejected the status update.");
    assert_eq!(column_ids(&board, TaskStatus::Draft), vec![5, 7, 9]);
}

#[tokio::test]
async fn board_stays_usable_after_a_rollback() {
    let gateway = Arc::new(InMemoryGateway::with_tasks(seed_tasks()));
    gateway.fail_next_update(SyncError::Network {
        detail: "timed out".to_string(),
    });
    let (cmd_tx, mut evt_rx) = net::spawn_sync(Arc::clone(&gateway), 8);

    let mut board = Board::from_tasks(seed_tasks());
    let mut ctl = DragController::new();

    // First attempt fails and rolls back.
    ctl.begin_drag(&board, TaskId::new(7));
    let first = ctl
        .handle_drop(&mut board, TaskStatus::Completed, None)
        .unwrap();
    cmd_tx
        .send(SyncCommand::UpdateStatus {
            generation: first.generation,
            task_id: first.task_id,
            status: first.status,
        })
        .await
        .unwrap();
    let (generation, outcome) = recv_update(&mut evt_rx).await;
    ctl.complete_drop(&mut board, generation, &outcome).unwrap();
    assert_eq!(column_ids(&board, TaskStatus::Draft), vec![5, 7, 9]);

    // Second attempt of the same card goes through cleanly.
    ctl.begin_drag(&board, TaskId::new(7));
    let second = ctl
        .handle_drop(&mut board, TaskStatus::Completed, None)
        .unwrap();
    cmd_tx
        .send(SyncCommand::UpdateStatus {
            generation: second.generation,
            task_id: second.task_id,
            status: second.status,
        })
        .await
        .unwrap();
    let (generation, outcome) = recv_update(&mut evt_rx).await;
    assert_eq!(outcome, DropOutcome::Confirmed);
    assert!(ctl.complete_drop(&mut board, generation, &outcome).is_none());

    assert_eq!(column_ids(&board, TaskStatus::Completed), vec![7]);
    assert_eq!(gateway.recorded_updates().len(), 2);
}

// ===========================================================================
// Last drag wins
// ===========================================================================

#[tokio::test]
async fn stale_failure_does_not_undo_a_newer_drop() {
    let gateway = Arc::new(InMemoryGateway::with_tasks(seed_tasks()));
    gateway.fail_next_update(SyncError::HttpStatus {
        status: 502,
        body: "bad gateway".to_string(),
    });
    let (cmd_tx, mut evt_rx) = net::spawn_sync(gateway, 8);

    let mut board = Board::from_tasks(seed_tasks());
    let mut ctl = DragController::new();

    // First drop: draft -> completed. Its resolution (a failure) is
    // received but deliberately not applied yet, as if it were still
    // on the wire.
    ctl.begin_drag(&board, TaskId::new(7));
    let first = ctl
        .handle_drop(&mut board, TaskStatus::Completed, None)
        .unwrap();
    cmd_tx
        .send(SyncCommand::UpdateStatus {
            generation: first.generation,
            task_id: first.task_id,
            status: first.status,
        })
        .await
        .unwrap();
    let (first_gen, first_outcome) = recv_update(&mut evt_rx).await;
    assert!(matches!(first_outcome, DropOutcome::HttpError { .. }));

    // The user drags the same card again before that failure lands.
    ctl.begin_drag(&board, TaskId::new(7));
    let second = ctl
        .handle_drop(&mut board, TaskStatus::Archived, None)
        .unwrap();
    cmd_tx
        .send(SyncCommand::UpdateStatus {
            generation: second.generation,
            task_id: second.task_id,
            status: second.status,
        })
        .await
        .unwrap();
    let (second_gen, second_outcome) = recv_update(&mut evt_rx).await;
    assert_eq!(second_outcome, DropOutcome::Confirmed);

    // The stale failure arrives: no rollback, no alert.
    let failure = ctl.complete_drop(&mut board, first_gen, &first_outcome);
    assert!(failure.is_none());
    assert_eq!(column_ids(&board, TaskStatus::Archived), vec![7]);

    // The newer resolution settles normally.
    assert!(
        ctl.complete_drop(&mut board, second_gen, &second_outcome)
            .is_none()
    );
    assert_eq!(column_ids(&board, TaskStatus::Archived), vec![7]);
    assert_eq!(ctl.pending_count(), 0);
}

// ===========================================================================
// Key-driven flows through the App
// ===========================================================================

#[tokio::test]
async fn keyboard_drag_failure_raises_blocking_alert() {
    let gateway = Arc::new(InMemoryGateway::with_tasks(seed_tasks()));
    gateway.fail_next_update(SyncError::HttpStatus {
        status: 500,
        body: "internal error".to_string(),
    });
    let (cmd_tx, mut evt_rx) = net::spawn_sync(gateway, 8);

    let mut app = App::new("%Y-%m-%d".to_string());
    app.apply_sync_event(SyncEvent::BoardFetched(seed_tasks()));

    // Pick up card 5 in draft, move one column right, drop.
    assert!(app.handle_key_event(press(KeyCode::Char(' '))).is_none());
    assert!(app.handle_key_event(press(KeyCode::Char('l'))).is_none());
    let command = app.handle_key_event(press(KeyCode::Char(' '))).unwrap();

    assert_eq!(column_ids(&app.board, TaskStatus::InProgress), vec![4, 5]);
    cmd_tx.send(command).await.unwrap();

    let event = recv_event(&mut evt_rx).await;
    app.apply_sync_event(event);

    // Blocking alert with the move undone underneath it.
    assert_eq!(app.mode, Mode::Alert);
    assert_eq!(
        app.current_alert(),
        Some("Failed to update task status (see log).")
    );
    assert_eq!(column_ids(&app.board, TaskStatus::Draft), vec![5, 7, 9]);
    assert_eq!(column_ids(&app.board, TaskStatus::InProgress), vec![4]);

    // Board keys are swallowed until the alert is answered.
    assert!(app.handle_key_event(press(KeyCode::Char('j'))).is_none());
    assert_eq!(app.mode, Mode::Alert);
    app.handle_key_event(press(KeyCode::Enter));
    assert_eq!(app.mode, Mode::Normal);
}

#[tokio::test]
async fn delete_confirmation_round_trip() {
    let gateway = Arc::new(InMemoryGateway::with_tasks(seed_tasks()));
    let (cmd_tx, mut evt_rx) = net::spawn_sync(Arc::clone(&gateway), 8);

    let mut app = App::new("%Y-%m-%d".to_string());
    app.apply_sync_event(SyncEvent::BoardFetched(seed_tasks()));

    // 'd' arms the guard; the card is still there until 'y' and the
    // server's answer.
    assert!(app.handle_key_event(press(KeyCode::Char('d'))).is_none());
    assert_eq!(app.mode, Mode::ConfirmDelete(TaskId::new(5)));
    assert!(app.board.contains(TaskId::new(5)));

    let command = app.handle_key_event(press(KeyCode::Char('y'))).unwrap();
    assert!(matches!(command, SyncCommand::DeleteTask(id) if id == TaskId::new(5)));
    assert!(
        app.board.contains(TaskId::new(5)),
        "removal must wait for the server"
    );

    cmd_tx.send(command).await.unwrap();
    let event = recv_event(&mut evt_rx).await;
    app.apply_sync_event(event);

    assert!(!app.board.contains(TaskId::new(5)));
    assert_eq!(gateway.recorded_deletes(), vec![TaskId::new(5)]);
}

#[tokio::test]
async fn failed_delete_keeps_card_and_alerts() {
    let gateway = Arc::new(InMemoryGateway::with_tasks(seed_tasks()));
    gateway.fail_next_delete(SyncError::Network {
        detail: "connection reset".to_string(),
    });
    let (cmd_tx, mut evt_rx) = net::spawn_sync(gateway, 8);

    let mut app = App::new("%Y-%m-%d".to_string());
    app.apply_sync_event(SyncEvent::BoardFetched(seed_tasks()));

    app.handle_key_event(press(KeyCode::Char('d')));
    let command = app.handle_key_event(press(KeyCode::Char('y'))).unwrap();
    cmd_tx.send(command).await.unwrap();

    let event = recv_event(&mut evt_rx).await;
    app.apply_sync_event(event);

    assert!(app.board.contains(TaskId::new(5)));
    assert_eq!(app.mode, Mode::Alert);
    assert!(app.current_alert().unwrap().starts_with("Failed to delete"));
}

#[tokio::test]
async fn created_task_lands_in_the_selected_column() {
    let gateway = Arc::new(InMemoryGateway::with_tasks(seed_tasks()));
    let (cmd_tx, mut evt_rx) = net::spawn_sync(Arc::clone(&gateway), 8);

    let mut app = App::new("%Y-%m-%d".to_string());
    app.apply_sync_event(SyncEvent::BoardFetched(seed_tasks()));

    // Move to in_progress, open the input, type a title, submit.
    app.handle_key_event(press(KeyCode::Char('l')));
    app.handle_key_event(press(KeyCode::Char('n')));
    assert_eq!(app.mode, Mode::CreateTask);
    for ch in "ship it".chars() {
        app.handle_key_event(press(KeyCode::Char(ch)));
    }
    let command = app.handle_key_event(press(KeyCode::Enter)).unwrap();

    cmd_tx.send(command).await.unwrap();
    let event = recv_event(&mut evt_rx).await;
    app.apply_sync_event(event);

    let created = app
        .board
        .column(TaskStatus::InProgress)
        .cards
        .last()
        .unwrap();
    assert_eq!(created.title, "ship it");
    assert_eq!(created.status, TaskStatus::InProgress);
    // Stored server-side with a fresh id.
    assert!(gateway.snapshot().iter().any(|t| t.title == "ship it"));
}

#[tokio::test]
async fn refresh_replaces_the_board() {
    let gateway = Arc::new(InMemoryGateway::with_tasks(vec![make_task(
        1,
        TaskStatus::Completed,
    )]));
    let (cmd_tx, mut evt_rx) = net::spawn_sync(gateway, 8);

    let mut app = App::new("%Y-%m-%d".to_string());
    app.load_sample_board();
    assert!(app.board.card_count() > 1);

    let command = app.handle_key_event(press(KeyCode::Char('r'))).unwrap();
    assert!(matches!(command, SyncCommand::RefreshBoard));
    cmd_tx.send(command).await.unwrap();

    let event = recv_event(&mut evt_rx).await;
    app.apply_sync_event(event);

    assert_eq!(app.board.card_count(), 1);
    assert_eq!(column_ids(&app.board, TaskStatus::Completed), vec![1]);
}
