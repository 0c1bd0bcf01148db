//! End-to-end run: login, register, execute, delete, logout.
//!
//! Flow rules:
//! - a failed login ends the run; nothing else is sent
//! - any later failure skips the remaining stages up to logout
//! - logout is attempted whenever login succeeded

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::ServiceConfig;
use crate::error::{QueryClientError, Stage};
use crate::flatten::flatten;
use crate::query::{QueryLifecycle, ROWS_FIELD};
use crate::session::SessionManager;
use crate::transport::Transport;
use crate::types::{FlatEntry, QueryDefinition, QueryInvocation};

/// Outcome of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Succeeded,
    Failed { message: String, status: Option<u16> },
    /// Not attempted because an earlier stage failed
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

impl std::fmt::Display for StageReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            StageOutcome::Succeeded => write!(f, "{}: ok", self.stage),
            StageOutcome::Skipped => write!(f, "{}: skipped", self.stage),
            StageOutcome::Failed { message, .. } => write!(f, "{}: failed - {}", self.stage, message),
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// One report per stage, in run order
    pub stages: Vec<StageReport>,
    /// Flattened result rows, each row flattened from its own root
    pub entries: Vec<FlatEntry>,
    /// Number of result rows returned
    pub row_count: usize,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        !self.stages.is_empty()
            && self
                .stages
                .iter()
                .all(|s| s.outcome == StageOutcome::Succeeded)
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| &s.outcome)
    }

    /// Whether a request was sent for `stage`.
    pub fn attempted(&self, stage: Stage) -> bool {
        matches!(
            self.outcome(stage),
            Some(StageOutcome::Succeeded | StageOutcome::Failed { .. })
        )
    }

    fn record(&mut self, stage: Stage, result: Result<(), QueryClientError>) -> bool {
        let outcome = match result {
            Ok(()) => StageOutcome::Succeeded,
            Err(e) => {
                let e = e.into_stage(stage);
                if stage == Stage::Login {
                    error!("{}", e);
                } else {
                    warn!("{}", e);
                }
                StageOutcome::Failed {
                    status: e.status(),
                    message: e.to_string(),
                }
            }
        };
        let ok = outcome == StageOutcome::Succeeded;
        self.stages.push(StageReport { stage, outcome });
        ok
    }

    fn skip(&mut self, stages: &[Stage]) {
        for &stage in stages {
            self.stages.push(StageReport {
                stage,
                outcome: StageOutcome::Skipped,
            });
        }
    }
}

/// Drives one session through the full query lifecycle.
pub struct Orchestrator {
    sessions: SessionManager,
}

impl Orchestrator {
    pub fn new(config: ServiceConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            sessions: SessionManager::new(config, transport),
        }
    }

    pub async fn run(&self, definition: &QueryDefinition, invocation: &QueryInvocation) -> RunReport {
        let mut report = RunReport::default();
        let credentials = &self.sessions.config().credentials;

        let mut session = match self.sessions.login(credentials).await {
            Ok(session) => {
                report.record(Stage::Login, Ok(()));
                session
            }
            Err(e) => {
                report.record(Stage::Login, Err(e));
                report.skip(&[Stage::Register, Stage::Execute, Stage::Delete, Stage::Logout]);
                return report;
            }
        };

        let mut queries = QueryLifecycle::new(&self.sessions);
        let registered = report.record(
            Stage::Register,
            queries.register(&session, definition).await,
        );

        if registered {
            let executed = queries
                .execute(&session, &definition.identifier, invocation)
                .await
                .map(|tree| {
                    let rows = tree.rows(ROWS_FIELD).unwrap_or_default();
                    report.row_count = rows.len();
                    report.entries = rows.iter().flat_map(flatten).collect();
                });
            if report.record(Stage::Execute, executed) {
                let deleted = queries.delete(&session, &definition.identifier).await;
                report.record(Stage::Delete, deleted);
            } else {
                report.skip(&[Stage::Delete]);
            }
        } else {
            report.skip(&[Stage::Execute, Stage::Delete]);
        }

        let logged_out = self.sessions.logout(&mut session).await;
        report.record(Stage::Logout, logged_out);

        if report.succeeded() {
            info!(
                "Run complete: {} row(s), {} value(s)",
                report.row_count,
                report.entries.len()
            );
        }
        report
    }
}
