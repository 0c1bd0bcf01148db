//! sl-queries - run one ad-hoc query through the Service Layer and print
//! its flattened result rows.

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sl_queries::{config::Args, Orchestrator, ReqwestTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("sl_queries={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("{}", e);
        std::process::exit(2);
    }

    let config = args.service_config();
    info!("Service Layer: {}", config.base_url);
    info!("Company DB: {}", config.credentials.company_db);

    let transport = Arc::new(ReqwestTransport::new(&config)?);
    let orchestrator = Orchestrator::new(config, transport);

    let report = orchestrator
        .run(&args.query_definition(), &args.invocation())
        .await;

    for entry in &report.entries {
        println!("{}", entry);
    }
    for stage in &report.stages {
        info!("{}", stage);
    }

    if !report.succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
