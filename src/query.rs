//! Query resource lifecycle
//!
//! Tracks, per query identifier, whether this client has registered the
//! query (`Absent -> Registered -> Absent`). Execution and deletion are only
//! issued for registered queries. State is inferred from this client's own
//! calls; the server is never asked.

use reqwest::StatusCode;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::{QueryClientError, Result, Stage};
use crate::flatten::ResultTree;
use crate::session::{Session, SessionManager};
use crate::transport::Method;
use crate::types::{QueryDefinition, QueryInvocation, QueryRegistration};

/// Field of an execution response that holds the result rows
pub const ROWS_FIELD: &str = "value";

/// Registration state of one query identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Absent,
    Registered,
}

/// Path of a registered query resource, e.g. `SQLQueries('GetCardCodeData')`.
pub fn query_path(identifier: &str) -> String {
    format!("SQLQueries('{}')", urlencoding::encode(identifier))
}

/// Path (with query string) for executing a registered query.
pub fn list_path(identifier: &str, invocation: &QueryInvocation) -> String {
    let mut path = format!("{}/List", query_path(identifier));
    if !invocation.is_empty() {
        path.push('?');
        path.push_str(&invocation.query_string());
    }
    path
}

/// Registers, executes and deletes ad-hoc queries within a session.
pub struct QueryLifecycle<'a> {
    sessions: &'a SessionManager,
    /// Identifiers this client has registered and not yet deleted
    states: HashMap<String, QueryState>,
}

impl<'a> QueryLifecycle<'a> {
    pub fn new(sessions: &'a SessionManager) -> Self {
        Self {
            sessions,
            states: HashMap::new(),
        }
    }

    /// Current state of `identifier`; unknown identifiers are `Absent`.
    pub fn state(&self, identifier: &str) -> QueryState {
        self.states
            .get(identifier)
            .copied()
            .unwrap_or(QueryState::Absent)
    }

    /// Register a query. Only a `201 Created` counts as success.
    pub async fn register(&mut self, session: &Session, definition: &QueryDefinition) -> Result<()> {
        let body = serde_json::to_value(QueryRegistration::from(definition))?;
        let response = self
            .sessions
            .authenticated_request(session, Method::Post, "SQLQueries", Some(body))
            .await
            .map_err(|e| e.into_stage(Stage::Register))?;

        if response.status != StatusCode::CREATED {
            return Err(QueryClientError::Registration {
                status: Some(response.status.as_u16()),
                message: response.failure_message(),
            });
        }

        self.states
            .insert(definition.identifier.clone(), QueryState::Registered);
        info!("Query '{}' created", definition.identifier);
        Ok(())
    }

    /// Execute a registered query and return the whole response document.
    ///
    /// The document must be a JSON object whose `value` field is the array
    /// of result rows.
    pub async fn execute(
        &self,
        session: &Session,
        identifier: &str,
        invocation: &QueryInvocation,
    ) -> Result<ResultTree> {
        self.require_registered(identifier, Stage::Execute)?;

        let response = self
            .sessions
            .authenticated_request(session, Method::Get, &list_path(identifier, invocation), None)
            .await
            .map_err(|e| e.into_stage(Stage::Execute))?;

        if response.status != StatusCode::OK {
            return Err(QueryClientError::Execution {
                status: Some(response.status.as_u16()),
                message: response.failure_message(),
            });
        }

        let tree = ResultTree::from_slice(&response.body).map_err(|e| QueryClientError::Execution {
            status: Some(response.status.as_u16()),
            message: format!("invalid result document: {}", e),
        })?;

        let Some(rows) = tree.rows(ROWS_FIELD) else {
            return Err(QueryClientError::Execution {
                status: Some(response.status.as_u16()),
                message: format!("result document has no '{}' array", ROWS_FIELD),
            });
        };

        info!("Query '{}' called, {} row(s)", identifier, rows.len());
        Ok(tree)
    }

    /// Delete a registered query.
    ///
    /// The identifier is `Absent` afterwards whether or not the server
    /// confirmed the deletion; a failure is returned for reporting only.
    pub async fn delete(&mut self, session: &Session, identifier: &str) -> Result<()> {
        self.require_registered(identifier, Stage::Delete)?;
        self.states.remove(identifier);

        let response = self
            .sessions
            .authenticated_request(session, Method::Delete, &query_path(identifier), None)
            .await
            .map_err(|e| e.into_stage(Stage::Delete))?;

        if response.status != StatusCode::NO_CONTENT {
            warn!(
                "Query '{}' may still exist on the server (status {})",
                identifier, response.status
            );
            return Err(QueryClientError::Deletion {
                status: Some(response.status.as_u16()),
                message: response.failure_message(),
            });
        }

        info!("Query '{}' removed", identifier);
        Ok(())
    }

    fn require_registered(&self, identifier: &str, stage: Stage) -> Result<()> {
        match self.state(identifier) {
            QueryState::Registered => Ok(()),
            QueryState::Absent => Err(QueryClientError::InvalidState {
                stage,
                identifier: identifier.to_string(),
            }),
        }
    }
}
