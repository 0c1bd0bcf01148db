//! Session management
//!
//! A `Session` is opened by `SessionManager::login` and carries the
//! `B1SESSION` token. Authenticated requests are refused unless the session
//! is `Active`; logout terminates it unconditionally.

use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{Credentials, ServiceConfig};
use crate::error::{QueryClientError, Result};
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};
use crate::types::{LoginRequest, LoginResponse};

/// Cookie name the Service Layer issues its session token under
pub const SESSION_COOKIE: &str = "B1SESSION";

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Active,
    Terminated,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Active => "active",
            SessionState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// One authenticated connection to the service
pub struct Session {
    token: String,
    state: SessionState,
    /// Server-side idle timeout in minutes, if reported at login
    pub timeout_minutes: Option<u32>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("timeout_minutes", &self.timeout_minutes)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// A session that has not logged in.
    pub fn unauthenticated() -> Self {
        Self {
            token: String::new(),
            state: SessionState::Unauthenticated,
            timeout_minutes: None,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    fn cookie(&self) -> String {
        format!("{}={}", SESSION_COOKIE, self.token)
    }
}

/// Owns the transport and issues requests on behalf of a session
pub struct SessionManager {
    config: ServiceConfig,
    transport: Arc<dyn Transport>,
}

impl SessionManager {
    pub fn new(config: ServiceConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Log in and open a new active session.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let request = json_request(Method::Post, self.config.url("Login"))
            .with_json(&LoginRequest::from(credentials))?;

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| QueryClientError::Auth {
                status: None,
                message: e.to_string(),
            })?;

        if !response.status.is_success() {
            return Err(QueryClientError::Auth {
                status: Some(response.status.as_u16()),
                message: response.failure_message(),
            });
        }

        let body: LoginResponse = response.json().map_err(|e| QueryClientError::Auth {
            status: Some(response.status.as_u16()),
            message: format!("invalid login response: {}", e),
        })?;

        let token = body
            .session_id
            .filter(|t| !t.is_empty())
            .ok_or_else(|| QueryClientError::Auth {
                status: Some(response.status.as_u16()),
                message: "login response carried no SessionId".to_string(),
            })?;

        info!(
            "Logged in as {} to {} (server version {})",
            credentials.username,
            credentials.company_db,
            body.version.as_deref().unwrap_or("unknown")
        );

        Ok(Session {
            token,
            state: SessionState::Active,
            timeout_minutes: body.session_timeout,
        })
    }

    /// Send a request carrying the session cookie.
    ///
    /// Any response is returned as-is; interpreting the status is up to
    /// the caller.
    pub async fn authenticated_request(
        &self,
        session: &Session,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse> {
        if !session.is_active() {
            return Err(QueryClientError::NotAuthenticated(session.state.to_string()));
        }

        let mut request =
            json_request(method, self.config.url(path)).with_header("Cookie", session.cookie());
        if let Some(body) = body {
            request = request.with_json(&body)?;
        }

        Ok(self.transport.send(request).await?)
    }

    /// End the session.
    ///
    /// The session is terminated whatever the outcome; an error only
    /// reports that the server may not have released it.
    pub async fn logout(&self, session: &mut Session) -> Result<()> {
        if !session.is_active() {
            session.state = SessionState::Terminated;
            return Err(QueryClientError::NotAuthenticated(session.state.to_string()));
        }

        let request = HttpRequest::new(Method::Post, self.config.url("Logout"))
            .with_header("Accept", "application/json")
            .with_header("Cookie", session.cookie());

        session.state = SessionState::Terminated;
        session.token.clear();

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| QueryClientError::Logout {
                status: None,
                message: e.to_string(),
            })?;

        match response.status {
            StatusCode::NO_CONTENT | StatusCode::OK => {
                info!("Logged out");
                Ok(())
            }
            status => {
                warn!("Logout returned status {}", status);
                Err(QueryClientError::Logout {
                    status: Some(status.as_u16()),
                    message: response.failure_message(),
                })
            }
        }
    }
}

/// Request with the JSON content headers every Service Layer call sends.
pub(crate) fn json_request(method: Method, url: String) -> HttpRequest {
    HttpRequest::new(method, url)
        .with_header("Content-Type", "application/json")
        .with_header("Accept", "application/json")
}
