//! Error types for the query client

use thiserror::Error;

/// Stage of a run an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Login,
    Register,
    Execute,
    Delete,
    Logout,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Login => "login",
            Stage::Register => "register",
            Stage::Execute => "execute",
            Stage::Delete => "delete",
            Stage::Logout => "logout",
        };
        f.write_str(name)
    }
}

/// Query client error
#[derive(Debug, Error)]
pub enum QueryClientError {
    /// Login rejected or failed
    #[error("Authentication failed{}: {message}", fmt_status(.status))]
    Auth { status: Option<u16>, message: String },

    /// Authenticated request attempted outside an active session
    #[error("Not authenticated: session is {0}")]
    NotAuthenticated(String),

    /// Query registration failed
    #[error("Query registration failed{}: {message}", fmt_status(.status))]
    Registration { status: Option<u16>, message: String },

    /// Query execution failed
    #[error("Query execution failed{}: {message}", fmt_status(.status))]
    Execution { status: Option<u16>, message: String },

    /// Query deletion failed
    #[error("Query deletion failed{}: {message}", fmt_status(.status))]
    Deletion { status: Option<u16>, message: String },

    /// Logout failed
    #[error("Logout failed{}: {message}", fmt_status(.status))]
    Logout { status: Option<u16>, message: String },

    /// Lifecycle operation not valid for the query's current state
    #[error("Query '{identifier}' cannot {stage}: it is not registered")]
    InvalidState { stage: Stage, identifier: String },

    /// Transport could not produce a response
    #[error("Transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {})", s)).unwrap_or_default()
}

impl QueryClientError {
    /// Stage this error is reported under, if it belongs to one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            QueryClientError::Auth { .. } => Some(Stage::Login),
            QueryClientError::Registration { .. } => Some(Stage::Register),
            QueryClientError::Execution { .. } => Some(Stage::Execute),
            QueryClientError::Deletion { .. } => Some(Stage::Delete),
            QueryClientError::Logout { .. } => Some(Stage::Logout),
            QueryClientError::InvalidState { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Remote status code, where one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            QueryClientError::Auth { status, .. }
            | QueryClientError::Registration { status, .. }
            | QueryClientError::Execution { status, .. }
            | QueryClientError::Deletion { status, .. }
            | QueryClientError::Logout { status, .. } => *status,
            _ => None,
        }
    }

    /// Re-home a stage-less error (transport, JSON, session) under `stage`.
    ///
    /// Stage-specific errors are returned unchanged.
    pub fn into_stage(self, stage: Stage) -> Self {
        if self.stage().is_some() {
            return self;
        }
        let message = self.to_string();
        match stage {
            Stage::Login => QueryClientError::Auth { status: None, message },
            Stage::Register => QueryClientError::Registration { status: None, message },
            Stage::Execute => QueryClientError::Execution { status: None, message },
            Stage::Delete => QueryClientError::Deletion { status: None, message },
            Stage::Logout => QueryClientError::Logout { status: None, message },
        }
    }
}

/// Result type for query client operations
pub type Result<T> = std::result::Result<T, QueryClientError>;
