//! HTTP API core: shared state, route handlers, and CSRF enforcement.
//!
//! Mutating requests arrive as `application/x-www-form-urlencoded`
//! bodies and must pass the double-submit CSRF check: the token issued
//! as a cookie by `GET /api/session` has to come back in the
//! `X-CSRFToken` header. A failed check answers `403`; business-level
//! rejections (unknown task, invalid title) answer `200` with a
//! `{"success": false}` envelope, which is what clients roll back on.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Form, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use termboard_proto::task::{Task, TaskStatus, validate_title};
use termboard_proto::wire::{
    CSRF_COOKIE, CSRF_HEADER, CreateTaskRequest, CreateTaskResponse, DeleteTaskRequest,
    StatusUpdateRequest, UpdateResponse,
};

use crate::store::TaskStore;

/// Shared server state holding the task registry.
pub struct ServerState {
    /// Task registry behind the API.
    pub store: TaskStore,
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerState {
    /// Creates server state with an empty store and default limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: TaskStore::new(),
        }
    }

    /// Creates server state with a custom task cap from the resolved
    /// [`crate::config::ServerConfig`].
    #[must_use]
    pub fn with_config(max_tasks: usize) -> Self {
        Self {
            store: TaskStore::with_max_tasks(max_tasks),
        }
    }
}

/// Extracts a named cookie value from the `Cookie` request header.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Double-submit check: the CSRF cookie must be present, non-empty,
/// and equal to the `X-CSRFToken` header.
fn csrf_ok(headers: &HeaderMap) -> bool {
    let Some(cookie_token) = cookie_value(headers, CSRF_COOKIE) else {
        return false;
    };
    let header_token = headers
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    !cookie_token.is_empty() && cookie_token == header_token
}

fn csrf_rejection() -> Response {
    (StatusCode::FORBIDDEN, "CSRF verification failed").into_response()
}

/// `GET /api/session`: issues a fresh CSRF token as a cookie.
async fn open_session() -> Response {
    let token = Uuid::now_v7().to_string();
    tracing::debug!("session opened, CSRF token issued");
    let cookie = format!("{CSRF_COOKIE}={token}; Path=/");
    (
        [(header::SET_COOKIE, cookie)],
        Json(UpdateResponse::ok()),
    )
        .into_response()
}

/// `GET /api/tasks`: the full board snapshot as a JSON array.
async fn list_tasks(State(state): State<Arc<ServerState>>) -> Json<Vec<Task>> {
    Json(state.store.list().await)
}

/// `POST /api/tasks/status`: moves a task to a new column.
async fn update_status(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Form(request): Form<StatusUpdateRequest>,
) -> Response {
    if !csrf_ok(&headers) {
        return csrf_rejection();
    }
    if state.store.set_status(request.task_id, request.status).await {
        tracing::debug!(task_id = %request.task_id, status = %request.status, "status updated");
        Json(UpdateResponse::ok()).into_response()
    } else {
        tracing::debug!(task_id = %request.task_id, "status update for unknown task");
        Json(UpdateResponse::rejected("unknown task")).into_response()
    }
}

/// `POST /api/tasks`: creates a task from a form body.
async fn create_task(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Form(request): Form<CreateTaskRequest>,
) -> Response {
    if !csrf_ok(&headers) {
        return csrf_rejection();
    }
    if let Err(err) = validate_title(&request.title) {
        return Json(CreateTaskResponse {
            success: false,
            task: None,
            error: Some(err.to_string()),
        })
        .into_response();
    }
    let created = state
        .store
        .create(
            request.title,
            request.status.unwrap_or(TaskStatus::Draft),
            request.priority.unwrap_or_default(),
            request.deadline,
        )
        .await;
    match created {
        Some(task) => {
            tracing::info!(task_id = %task.id, "task created");
            Json(CreateTaskResponse {
                success: true,
                task: Some(task),
                error: None,
            })
            .into_response()
        }
        None => Json(CreateTaskResponse {
            success: false,
            task: None,
            error: Some("task limit reached".to_string()),
        })
        .into_response(),
    }
}

/// `POST /api/tasks/delete`: removes a task.
async fn delete_task(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Form(request): Form<DeleteTaskRequest>,
) -> Response {
    if !csrf_ok(&headers) {
        return csrf_rejection();
    }
    if state.store.delete(request.task_id).await {
        tracing::info!(task_id = %request.task_id, "task deleted");
        Json(UpdateResponse::ok()).into_response()
    } else {
        Json(UpdateResponse::rejected("unknown task")).into_response()
    }
}

/// Starts the task server on the given address and returns the bound
/// address and a join handle.
///
/// This is the primary entry point used by both `main.rs` and test code.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(ServerState::new())).await
}

/// Starts the task server with a pre-configured [`ServerState`].
///
/// Use [`ServerState::with_config`] to create a state with a custom
/// task cap from the resolved [`crate::config::ServerConfig`].
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<ServerState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = axum::Router::new()
        .route("/api/session", axum::routing::get(open_session))
        .route(
            "/api/tasks",
            axum::routing::get(list_tasks).post(create_task),
        )
        .route("/api/tasks/status", axum::routing::post(update_status))
        .route("/api/tasks/delete", axum::routing::post(delete_task))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "task server error");
        }
    });

    Ok((bound_addr, handle))
}
