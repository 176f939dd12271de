//! Production HTTP gateway to the task server.
//!
//! Speaks the original web contract: mutating calls are form-encoded
//! POSTs carrying the CSRF token in the `X-CSRFToken` header (empty
//! when no token is held) and the session cookies in the `Cookie`
//! header; replies are JSON `{"success": …}` envelopes. `Set-Cookie`
//! headers on any response are absorbed into the jar, which is how the
//! CSRF cookie from `/api/session` becomes available to the
//! credential provider.

use std::sync::Arc;

use reqwest::header::{COOKIE, SET_COOKIE};
use url::Url;

use termboard_proto::task::{Task, TaskId, TaskStatus};
use termboard_proto::wire::{
    CSRF_HEADER, CreateTaskRequest, CreateTaskResponse, DeleteTaskRequest, StatusUpdateRequest,
    UpdateResponse,
};

use super::credentials::{CookieJar, CredentialProvider};
use super::{StatusGateway, SyncError};

/// HTTP implementation of [`StatusGateway`] over `reqwest`.
pub struct HttpGateway<P: CredentialProvider> {
    client: reqwest::Client,
    base: Url,
    jar: Arc<CookieJar>,
    credentials: P,
}

impl<P: CredentialProvider> HttpGateway<P> {
    /// Creates a gateway against `base` (an origin like
    /// `http://127.0.0.1:8350`) with an injected credential provider
    /// and a fresh cookie jar.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidUrl`] if `base` does not parse, or
    /// [`SyncError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(base: &str, credentials: P) -> Result<Self, SyncError> {
        Self::with_jar(base, Arc::new(CookieJar::new()), credentials)
    }

    /// Creates a gateway sharing an existing cookie jar.
    ///
    /// # Errors
    ///
    /// Same conditions as [`HttpGateway::new`].
    pub fn with_jar(base: &str, jar: Arc<CookieJar>, credentials: P) -> Result<Self, SyncError> {
        let base = normalize_base(base)?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SyncError::ClientBuild(e.to_string()))?;
        Ok(Self {
            client,
            base,
            jar,
            credentials,
        })
    }

    /// The cookie jar this gateway stores session cookies in.
    #[must_use]
    pub fn jar(&self) -> &Arc<CookieJar> {
        &self.jar
    }

    fn endpoint(&self, path: &str) -> Result<Url, SyncError> {
        self.base
            .join(path)
            .map_err(|e| SyncError::InvalidUrl(e.to_string()))
    }

    fn absorb_cookies(&self, response: &reqwest::Response) {
        for value in response.headers().get_all(SET_COOKIE) {
            if let Ok(header) = value.to_str() {
                self.jar.store_set_cookie(header);
            }
        }
    }

    /// Issues a GET, absorbing cookies and turning non-2xx statuses
    /// into [`SyncError::HttpStatus`].
    async fn get(&self, path: &str) -> Result<reqwest::Response, SyncError> {
        let url = self.endpoint(path)?;
        let mut request = self.client.get(url);
        if let Some(cookies) = self.jar.cookie_header() {
            request = request.header(COOKIE, cookies);
        }
        let response = request.send().await.map_err(|e| SyncError::Network {
            detail: e.to_string(),
        })?;
        self.absorb_cookies(&response);
        error_for_status(response).await
    }

    /// Issues a form-encoded POST with the CSRF header attached.
    ///
    /// An absent token is sent as the empty string, per the contract.
    async fn post_form<B>(&self, path: &str, body: &B) -> Result<reqwest::Response, SyncError>
    where
        B: serde::Serialize + Sync,
    {
        let url = self.endpoint(path)?;
        let token = self.credentials.csrf_token().unwrap_or_default();
        let mut request = self.client.post(url).header(CSRF_HEADER, token).form(body);
        if let Some(cookies) = self.jar.cookie_header() {
            request = request.header(COOKIE, cookies);
        }
        let response = request.send().await.map_err(|e| SyncError::Network {
            detail: e.to_string(),
        })?;
        self.absorb_cookies(&response);
        error_for_status(response).await
    }
}

/// Consumes a 2xx check: non-success statuses become
/// [`SyncError::HttpStatus`] carrying the body text for the log.
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::HttpStatus {
        status: status.as_u16(),
        body,
    })
}

/// Parses the `{"success": …}` envelope, mapping `success: false` to
/// [`SyncError::Rejected`].
async fn confirm(response: reqwest::Response) -> Result<(), SyncError> {
    let body: UpdateResponse =
        response
            .json()
            .await
            .map_err(|e| SyncError::MalformedResponse {
                detail: e.to_string(),
            })?;
    if body.success {
        Ok(())
    } else {
        Err(SyncError::Rejected {
            detail: body
                .error
                .unwrap_or_else(|| "no detail provided".to_string()),
        })
    }
}

/// Normalizes the base origin so endpoint joining works: the path must
/// end with a slash or `Url::join` would drop the last segment.
fn normalize_base(base: &str) -> Result<Url, SyncError> {
    let trimmed = base.trim_end_matches('/');
    Url::parse(&format!("{trimmed}/")).map_err(|e| SyncError::InvalidUrl(e.to_string()))
}

impl<P: CredentialProvider> StatusGateway for HttpGateway<P> {
    async fn open_session(&self) -> Result<(), SyncError> {
        self.get("api/session").await?;
        tracing::debug!(has_token = self.jar.csrf_token().is_some(), "session opened");
        Ok(())
    }

    async fn fetch_board(&self) -> Result<Vec<Task>, SyncError> {
        let response = self.get("api/tasks").await?;
        response
            .json()
            .await
            .map_err(|e| SyncError::MalformedResponse {
                detail: e.to_string(),
            })
    }

    async fn update_status(&self, task_id: TaskId, status: TaskStatus) -> Result<(), SyncError> {
        let request = StatusUpdateRequest { task_id, status };
        let response = self.post_form("api/tasks/status", &request).await?;
        confirm(response).await
    }

    async fn create_task(&self, draft: CreateTaskRequest) -> Result<Task, SyncError> {
        let response = self.post_form("api/tasks", &draft).await?;
        let body: CreateTaskResponse =
            response
                .json()
                .await
                .map_err(|e| SyncError::MalformedResponse {
                    detail: e.to_string(),
                })?;
        match (body.success, body.task) {
            (true, Some(task)) => Ok(task),
            _ => Err(SyncError::Rejected {
                detail: body
                    .error
                    .unwrap_or_else(|| "no detail provided".to_string()),
            }),
        }
    }

    async fn delete_task(&self, task_id: TaskId) -> Result<(), SyncError> {
        let request = DeleteTaskRequest { task_id };
        let response = self.post_form("api/tasks/delete", &request).await?;
        confirm(response).await
    }
}
