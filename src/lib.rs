//! Client for running ad-hoc SQL queries through the SAP Business One
//! Service Layer.
//!
//! One run logs in, registers a named query, executes it with bound
//! parameters, flattens the result rows into `(path, value)` entries,
//! deletes the query and logs out.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sl_queries::{
//!     Credentials, Orchestrator, QueryDefinition, QueryInvocation, ReqwestTransport,
//!     ServiceConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::new(
//!     "https://localhost:50000/b1s/v1",
//!     Credentials::new("manager", "secret", "SBODemoUS"),
//! );
//! let transport = Arc::new(ReqwestTransport::new(&config)?);
//! let orchestrator = Orchestrator::new(config, transport);
//!
//! let report = orchestrator
//!     .run(
//!         &QueryDefinition::new(
//!             "GetCardCodeData",
//!             "Card lookup",
//!             "select cardcode, cardname from ocrd where cardcode = :cardcode",
//!         ),
//!         &QueryInvocation::new().with_param("cardcode", "'C20000'"),
//!     )
//!     .await;
//!
//! for entry in &report.entries {
//!     println!("{}", entry);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod flatten;
pub mod orchestrator;
pub mod query;
pub mod session;
pub mod transport;
pub mod types;

// Re-export main types
pub use config::{Args, Credentials, ServiceConfig};
pub use error::{QueryClientError, Result, Stage};
pub use flatten::{flatten, flatten_with_prefix, ResultTree, Scalar};
pub use orchestrator::{Orchestrator, RunReport, StageOutcome, StageReport};
pub use query::{QueryLifecycle, QueryState};
pub use session::{Session, SessionManager, SessionState};
pub use transport::{MockTransport, ReqwestTransport, Transport, TransportError};
pub use types::*;
