//! Server synchronization layer for `TermBoard`.
//!
//! Defines the [`StatusGateway`] trait that the board's async
//! operations go through. Concrete implementations:
//! - [`gateway::HttpGateway`] — production HTTP client against the task
//!   server (form-encoded POSTs, CSRF header, session cookies)
//! - [`memory::InMemoryGateway`] — in-process scripted gateway for tests
//!
//! Credential lookup is abstracted behind
//! [`credentials::CredentialProvider`] so nothing in the update path
//! knows where the CSRF token physically lives.

pub mod credentials;
pub mod gateway;
pub mod memory;

use termboard_proto::task::{Task, TaskId, TaskStatus};
use termboard_proto::wire::CreateTaskRequest;

use crate::board::drag::DropOutcome;

/// Errors that can occur while talking to the task server.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// Response body text, for diagnostics.
        body: String,
    },

    /// The server answered 2xx but reported `success: false`.
    #[error("server rejected the update: {detail}")]
    Rejected {
        /// Server-supplied detail.
        detail: String,
    },

    /// The request never completed (connection refused, DNS, timeout).
    #[error("request failed: {detail}")]
    Network {
        /// Transport-level detail.
        detail: String,
    },

    /// The response body was not the expected JSON shape.
    #[error("malformed response body: {detail}")]
    MalformedResponse {
        /// Parse failure detail.
        detail: String,
    },

    /// The configured server URL could not be parsed or joined.
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl SyncError {
    /// Maps this error onto the drop-resolution taxonomy the drag
    /// controller understands.
    ///
    /// A malformed body counts as a network-class failure: the request
    /// completed but nothing trustworthy came back.
    #[must_use]
    pub fn to_outcome(&self) -> DropOutcome {
        match self {
            Self::HttpStatus { status, body } => DropOutcome::HttpError {
                status: *status,
                body: body.clone(),
            },
            Self::Rejected { detail } => DropOutcome::Rejected {
                detail: detail.clone(),
            },
            Self::Network { detail } | Self::MalformedResponse { detail } => {
                DropOutcome::NetworkError {
                    detail: detail.clone(),
                }
            }
            Self::InvalidUrl(detail) | Self::ClientBuild(detail) => DropOutcome::NetworkError {
                detail: detail.clone(),
            },
        }
    }
}

/// Async gateway to the task server.
///
/// Implementations perform the actual request/response exchange; the
/// drag controller and app layer only ever see the resolved
/// `Result`. Mutating calls carry the CSRF token and session
/// credentials; how is an implementation detail.
pub trait StatusGateway: Send + Sync {
    /// Bootstrap the session: contact the server so it issues the CSRF
    /// cookie used by later mutating calls.
    fn open_session(&self) -> impl std::future::Future<Output = Result<(), SyncError>> + Send;

    /// Fetch every task for the board, in stable server order.
    fn fetch_board(&self) -> impl std::future::Future<Output = Result<Vec<Task>, SyncError>> + Send;

    /// Report a card relocation: set `task_id`'s status to `status`.
    ///
    /// `Ok(())` means the server confirmed with `success: true`;
    /// every other response shape resolves to an error.
    fn update_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
    ) -> impl std::future::Future<Output = Result<(), SyncError>> + Send;

    /// Create a task and return the record the server stored.
    fn create_task(
        &self,
        draft: CreateTaskRequest,
    ) -> impl std::future::Future<Output = Result<Task, SyncError>> + Send;

    /// Delete a task.
    fn delete_task(
        &self,
        task_id: TaskId,
    ) -> impl std::future::Future<Output = Result<(), SyncError>> + Send;
}
