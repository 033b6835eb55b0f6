use anyhow::Context;
use beacon_server::{AppState, RoomRegistry, ServerConfig, app};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env();
    info!(?config, "starting signaling relay");

    let registry = RoomRegistry::new(config.idle_grace, None);
    let state = Arc::new(AppState::new(registry));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to listen on {addr}"))?;
    info!("signaling server listening on http://{addr}");

    axum::serve(listener, app(state))
        .await
        .context("server error")?;

    Ok(())
}
