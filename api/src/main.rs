use std::sync::Arc;

use anyhow::Result;
use api::{router, AppState};
use migration::{Migrator, MigratorTrait};
use shared::{get_db_connection, get_pool, Config, FinnhubPullerFactory, TimescaleStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting stock price API server...");

    let config = Config::from_env()?;

    if config.run_migrations {
        let db = get_db_connection(&config.database_url()).await?;
        Migrator::up(&db, None).await?;
        db.close().await?;
        info!("Database migrations applied");
    }

    let pool = get_pool(&config.database_url()).await?;
    info!("Connected to database");

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(
        Arc::new(TimescaleStore::new(pool)),
        Arc::new(FinnhubPullerFactory::new(config)),
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("API server listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
