use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::MediaStore;
use tracing::info;

use server::config::AppConfig;
use server::state::AppState;
use server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // A missing or unknown storage backend stops startup here.
    let media = MediaStore::from_config(&config.storage)
        .await
        .context("Failed to configure media storage")?;
    info!(backend = media.backend_name(), "Media storage ready");

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    seed::ensure_indexes(&db).await?;
    seed::seed_admin(&db, &config.seed)
        .await
        .context("Failed to seed administrator")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host / server.port")?;

    let state = AppState {
        db,
        config: Arc::new(config),
        media,
    };
    let app = build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
