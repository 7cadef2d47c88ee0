use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use chatiris_backend::core;
use chatiris_backend::core::config::AppPaths;
use chatiris_backend::server;
use chatiris_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    core::logging::init(&paths);

    let state = AppState::initialize(paths).await?;

    let bind_addr = format!(
        "{}:{}",
        state.settings.server.host, state.settings.server.port
    );
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("CHATIRIS_PORT={}", addr.port());
    tracing::info!(
        "Listening on {} (chat model: {}, score model: {})",
        addr,
        state.settings.chat_agent.model,
        state.settings.score_agent.model
    );

    let app: Router = server::router::router(state.clone());
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
