use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};

use family_records_backend::config::Config;
use family_records_backend::rest::{router, AppState};
use family_records_backend::storage::DbConnection;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let config = Arc::new(Config::from_env());

    info!("Setting up database at {}", config.database_url);
    let db = DbConnection::new(&config.database_url).await?;

    let state = AppState::new(db, config.clone());
    state.user_service.seed_admin().await?;

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
