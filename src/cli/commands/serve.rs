use anyhow::Context;
use clap::Args;
use tokio::net::TcpListener;

use crate::app::{router, AppState};
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::storage;

#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    #[arg(long, help = "Bind address (overrides HOST)")]
    pub host: Option<String>,

    #[arg(long, help = "Port (overrides PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Do not apply pending migrations on startup")]
    pub skip_migrations: bool,
}

pub async fn handle(args: ServeArgs, mut config: AppConfig) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Starting Notes API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    if config.database.run_migrations && !args.skip_migrations {
        DatabaseManager::migrate_up(&pool).await.context("failed to apply migrations")?;
    }

    let blobs = storage::from_config(&config.storage)
        .await
        .context("failed to initialize blob storage")?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    let app = router(AppState::new(pool, config, blobs));

    tracing::info!("Notes API listening on http://{}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
