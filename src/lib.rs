pub mod accounts;
pub mod api;
pub mod assessments;
pub mod chat;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod profile_pics;
pub mod risk;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::{CoreError, CoreState};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("Cannot create data directories: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] db::DatabaseError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Server(#[from] api::ServerError),
}

/// Install the global `tracing` subscriber (`RUST_LOG`, else the default filter).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Create the data directories and apply migrations.
pub fn init_db(config: &AppConfig) -> Result<(), StartupError> {
    config.ensure_dirs()?;
    db::open_database(&config.database_path())?;
    tracing::info!(path = %config.database_path().display(), "Database schema up to date");
    Ok(())
}

/// Run the service until Ctrl-C.
pub async fn serve(config: AppConfig) -> Result<(), StartupError> {
    tracing::info!("Heartwise starting v{}", config::APP_VERSION);
    init_db(&config)?;

    let addr = config.bind_addr;
    let core = Arc::new(CoreState::from_config(config));

    let conn = core.open_db()?;
    accounts::prune_sessions(&conn, chrono::Utc::now().naive_utc())?;
    drop(conn);

    let mut server = api::start_server(core.clone(), addr).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.stopped().await;

    if let Err(e) = core.flush_and_prune_audit() {
        tracing::warn!("Audit flush on shutdown failed: {e}");
    }
    Ok(())
}
