//! Lantern server - local chat and file index over an Ollama daemon.

use anyhow::Result;
use clap::Parser;
use lantern_server::{config, logging, state};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use logging::{LogConfig, LogFormat};
use state::AppState;

/// Lantern server - chat sessions and file index backed by SQLite.
#[derive(Parser, Debug)]
#[command(name = "lantern-server")]
#[command(about = "HTTP server for local chat sessions and file indexing")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Override database path from config
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Enable verbose logging (INFO level for all targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "chat=debug").
    /// Can be specified multiple times. Targets are prefixed with "lantern::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    tracing::info!(
        target: "lantern::startup",
        "Loaded configuration (port: {}, db: {}, ollama: {})",
        config.port,
        config.db_path.display(),
        config.ollama_url
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = Arc::new(AppState::new(config)?);
    tracing::info!(target: "lantern::startup", "Initialized application state");

    let app = lantern_server::app(state.clone());

    tracing::info!(target: "lantern::startup", "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.db.close()?;
    tracing::info!(target: "lantern::startup", "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "lantern::startup", "Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
