//! HTTP server for the user-admin API.
//!
//! Run from repo root: `cargo run -p admin-server`
//! Set `USER_ADMIN_STORAGE=memory` to run without PostgreSQL.

use tokio::net::TcpListener;
use user_admin::{app_router, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("user_admin=info,admin_server=info,tower_http=info")
            }),
        )
        .init();

    let state = AppState::from_config(&config).await?;
    let app = app_router(state, &config);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(storage = ?config.storage, "listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
