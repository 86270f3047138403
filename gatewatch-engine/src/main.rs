//! gatewatch-engine - invasive-species detection counter service
//!
//! Per-camera analysis sessions convert tracker output into deduplicated,
//! transactionally persisted daily counts, fire one-shot threshold
//! notifications, and publish best-effort gate-open signals.

use anyhow::Result;
use clap::Parser;
use gatewatch_common::config::{Settings, SettingsOverrides};
use gatewatch_common::db::init_database;
use gatewatch_engine::gate::HttpGatePublisher;
use gatewatch_engine::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "gatewatch-engine", about = "Invasive-species detection counter service")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long)]
    db: Option<PathBuf>,

    /// HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Base URL of the gate broker endpoint
    #[arg(long)]
    gate_endpoint: Option<String>,

    /// Topic the gate-open command is published to
    #[arg(long)]
    gate_topic: Option<String>,

    /// Default history window in days
    #[arg(long)]
    history_days: Option<u32>,

    /// Explicit config file (default: platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Gatewatch Engine (gatewatch-engine) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let cli = Cli::parse();
    let overrides = SettingsOverrides {
        database_path: cli.db,
        bind_addr: cli.bind,
        gate_endpoint: cli.gate_endpoint,
        gate_topic: cli.gate_topic,
        history_days: cli.history_days,
    };
    let settings = match cli.config {
        Some(path) => Settings::resolve_with_file(&overrides, Some(&path))?,
        None => Settings::resolve(&overrides)?,
    };

    info!("Database path: {}", settings.database_path.display());
    let pool = init_database(&settings.database_path).await?;

    info!(
        "Gate broker endpoint: {} (topic {})",
        settings.gate_endpoint, settings.gate_topic
    );
    let gate = Arc::new(HttpGatePublisher::new(settings.gate_endpoint.clone()));

    let bind_addr = settings.bind_addr.clone();
    let state = AppState::new(pool, gate, settings);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("gatewatch-engine listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
