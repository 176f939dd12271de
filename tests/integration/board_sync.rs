//! End-to-end tests over real HTTP: [`HttpGateway`] against an
//! in-process task server.
//!
//! These tests validate the wire contract the optimistic drag flow
//! depends on:
//! - `GET /api/session` issues the CSRF cookie the jar then echoes
//! - Board snapshots and status updates round-trip through axum
//! - A mutation without session credentials is refused with HTTP 403,
//!   which the client maps to a rollback-triggering outcome
//! - Transport failures surface as network errors, never panics

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use termboard::board::drag::{DragController, DropOutcome};
use termboard::board::model::Board;
use termboard::net::{self, SyncCommand, SyncEvent};
use termboard::sync::credentials::CookieJar;
use termboard::sync::gateway::HttpGateway;
use termboard::sync::{StatusGateway, SyncError};
use termboard_proto::task::{Priority, Task, TaskId, TaskStatus};
use termboard_proto::wire::CreateTaskRequest;
use termboard_server::server::{ServerState, start_server_with_state};

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

/// Starts a server seeded with cards 5, 7, 9 in draft and returns its
/// base URL, state handle, and join handle.
async fn start_seeded_server() -> (String, Arc<ServerState>, tokio::task::JoinHandle<()>) {
    let state = Arc::new(ServerState::new());
    state
        .store
        .seed(vec![
            make_task(5, TaskStatus::Draft),
            make_task(7, TaskStatus::Draft),
            make_task(9, TaskStatus::Draft),
        ])
        .await;
    let (addr, handle) = start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start task server");
    (format!("http://{addr}"), state, handle)
}

/// Builds a gateway whose cookie jar doubles as its credential
/// provider, exactly as the TUI wires it.
fn make_gateway(base: &str) -> HttpGateway<Arc<CookieJar>> {
    let jar = Arc::new(CookieJar::new());
    HttpGateway::with_jar(base, Arc::clone(&jar), jar).expect("gateway construction failed")
}

fn column_ids(board: &Board, status: TaskStatus) -> Vec<u64> {
    board
        .column(status)
        .cards
        .iter()
        .map(|t| t.id.as_u64())
        .collect()
}

// ===========================================================================
// Session bootstrap and board snapshot
// ===========================================================================

#[tokio::test]
async fn session_issues_csrf_token_into_the_jar() {
    let (base, _state, _handle) = start_seeded_server().await;
    let gateway = make_gateway(&base);

    assert!(gateway.jar().is_empty());
    gateway.open_session().await.expect("session failed");

    let token = gateway.jar().get("csrftoken");
    assert!(token.is_some(), "session must issue the CSRF cookie");
    assert!(!token.unwrap().is_empty());
}

#[tokio::test]
async fn board_snapshot_arrives_sorted_by_id() {
    let (base, _state, _handle) = start_seeded_server().await;
    let gateway = make_gateway(&base);

    let tasks = gateway.fetch_board().await.expect("fetch failed");
    let ids: Vec<u64> = tasks.iter().map(|t| t.id.as_u64()).collect();
    assert_eq!(ids, vec![5, 7, 9]);
    assert!(tasks.iter().all(|t| t.status == TaskStatus::Draft));
}

// ===========================================================================
// Status updates
// ===========================================================================

#[tokio::test]
async fn update_with_session_persists_on_the_server() {
    let (base, state, _handle) = start_seeded_server().await;
    let gateway = make_gateway(&base);

    gateway.open_session().await.expect("session failed");
    gateway
        .update_status(TaskId::new(7), TaskStatus::Completed)
        .await
        .expect("update failed");

    let stored = state.store.get(TaskId::new(7)).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Completed);
}

#[tokio::test]
async fn update_without_session_is_refused_with_403() {
    let (base, state, _handle) = start_seeded_server().await;
    let gateway = make_gateway(&base);

    // No open_session: the jar is empty, the CSRF header goes out as
    // the empty string, and the server must refuse.
    let err = gateway
        .update_status(TaskId::new(7), TaskStatus::Completed)
        .await
        .unwrap_err();

    match &err {
        SyncError::HttpStatus { status, body } => {
            assert_eq!(*status, 403);
            assert!(body.contains("CSRF"));
        }
        other => panic!("expected HttpStatus, got: {other:?}"),
    }
    // The outcome taxonomy sends this down the rollback path.
    assert!(matches!(
        err.to_outcome(),
        DropOutcome::HttpError { status: 403, .. }
    ));
    // Server state untouched.
    let stored = state.store.get(TaskId::new(7)).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Draft);
}

#[tokio::test]
async fn unknown_task_update_is_rejected_in_band() {
    let (base, _state, _handle) = start_seeded_server().await;
    let gateway = make_gateway(&base);

    gateway.open_session().await.expect("session failed");
    let err = gateway
        .update_status(TaskId::new(99), TaskStatus::Completed)
        .await
        .unwrap_err();

    // HTTP 200 with success: false, not an HTTP error.
    assert!(matches!(
        err,
        SyncError::Rejected { ref detail } if detail == "unknown task"
    ));
}

#[tokio::test]
async fn unreachable_server_surfaces_as_network_error() {
    // Bind and immediately drop a listener so the port is known-dead.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let gateway = make_gateway(&format!("http://127.0.0.1:{port}"));

    let err = gateway
        .update_status(TaskId::new(1), TaskStatus::Completed)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Network { .. }));
    assert!(matches!(err.to_outcome(), DropOutcome::NetworkError { .. }));
}

// ===========================================================================
// Create and delete
// ===========================================================================

#[tokio::test]
async fn create_and_delete_round_trip() {
    let (base, _state, _handle) = start_seeded_server().await;
    let gateway = make_gateway(&base);

    gateway.open_session().await.expect("session failed");

    let created = gateway
        .create_task(CreateTaskRequest {
            title: "wired task".to_string(),
            status: Some(TaskStatus::InProgress),
            priority: None,
            deadline: None,
        })
        .await
        .expect("create failed");
    assert_eq!(created.title, "wired task");
    assert_eq!(created.status, TaskStatus::InProgress);
    assert_eq!(created.priority, Priority::Medium);

    gateway.delete_task(created.id).await.expect("delete failed");

    let tasks = gateway.fetch_board().await.expect("fetch failed");
    assert!(tasks.iter().all(|t| t.id != created.id));
}

#[tokio::test]
async fn empty_title_is_rejected_by_the_server() {
    let (base, _state, _handle) = start_seeded_server().await;
    let gateway = make_gateway(&base);

    gateway.open_session().await.expect("session failed");
    let err = gateway
        .create_task(CreateTaskRequest {
            title: "   ".to_string(),
            status: None,
            priority: None,
            deadline: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Rejected { .. }));
}

// ===========================================================================
// Full client stack over the wire
// ===========================================================================

#[tokio::test]
async fn drop_confirmed_through_the_real_server() {
    let (base, state, _handle) = start_seeded_server().await;
    let gateway = Arc::new(make_gateway(&base));
    let (cmd_tx, mut evt_rx) = net::spawn_sync(gateway, 8);

    cmd_tx.send(SyncCommand::OpenSession).await.unwrap();
    assert!(matches!(
        recv_event(&mut evt_rx).await,
        SyncEvent::SessionOpened
    ));

    cmd_tx.send(SyncCommand::RefreshBoard).await.unwrap();
    let mut board = match recv_event(&mut evt_rx).await {
        SyncEvent::BoardFetched(tasks) => Board::from_tasks(tasks),
        other => panic!("expected BoardFetched, got: {other:?}"),
    };

    let mut ctl = DragController::new();
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

    match recv_event(&mut evt_rx).await {
        SyncEvent::UpdateResolved {
            generation,
            outcome,
            ..
        } => {
            assert_eq!(outcome, DropOutcome::Confirmed);
            assert!(ctl.complete_drop(&mut board, generation, &outcome).is_none());
        }
        other => panic!("expected UpdateResolved, got: {other:?}"),
    }

    assert_eq!(column_ids(&board, TaskStatus::Completed), vec![7]);
    let stored = state.store.get(TaskId::new(7)).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Completed);
}

#[tokio::test]
async fn csrf_refusal_rolls_the_card_back() {
    let (base, _state, _handle) = start_seeded_server().await;
    let gateway = Arc::new(make_gateway(&base));
    // Deliberately no OpenSession.
    let (cmd_tx, mut evt_rx) = net::spawn_sync(gateway, 8);

    let mut board = Board::from_tasks(vec![
        make_task(5, TaskStatus::Draft),
        make_task(7, TaskStatus::Draft),
        make_task(9, TaskStatus::Draft),
    ]);
    let mut ctl = DragController::new();

    ctl.begin_drag(&board, TaskId::new(7));
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

    match recv_event(&mut evt_rx).await {
        SyncEvent::UpdateResolved {
            generation,
            outcome,
            ..
        } => {
            assert!(matches!(outcome, DropOutcome::HttpError { status: 403, .. }));
            let failure = ctl.complete_drop(&mut board, generation, &outcome).unwrap();
            assert_eq!(failure.message, "Failed to update task status (see log).");
        }
        other => panic!("expected UpdateResolved, got: {other:?}"),
    }

    assert_eq!(column_ids(&board, TaskStatus::Draft), vec![5, 7, 9]);
    assert!(board.column(TaskStatus::Archived).is_empty());
}

/// Receives the next sync event or panics after a timeout.
async fn recv_event(rx: &mut tokio::sync::mpsc::Receiver<SyncEvent>) -> SyncEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for sync event")
        .expect("event channel closed unexpectedly")
}
