use crate::config::ServerConfig;
use crate::signaling::{SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub fn router(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(service)
}

async fn health(State(service): State<SignalingService>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "rooms": service.registry().room_count(),
    }))
}

/// Bind `config.bind` and serve until the process stops.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    serve_on(listener, config).await
}

/// Serve on an already bound listener (tests bind port 0).
pub async fn serve_on(listener: TcpListener, config: ServerConfig) -> Result<()> {
    let config = config.validate()?;
    let service = SignalingService::new(&config);

    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("Signaling server listening on ws://{}/ws", addr);

    axum::serve(listener, router(service))
        .await
        .context("Signaling server stopped")?;
    Ok(())
}
