use anyhow::Result;
use colored::*;
use pairlink::model::IceServerConfig;
use pairlink::server::{ServerConfig, serve};
use std::net::SocketAddr;
use tracing::info;

pub struct TurnArgs {
    pub url: String,
    pub username: Option<String>,
    pub credential: Option<String>,
}

pub async fn run(
    bind: SocketAddr,
    capacity: usize,
    notify_evicted: bool,
    turn: Option<TurnArgs>,
) -> Result<()> {
    let mut config = ServerConfig {
        bind,
        room_capacity: capacity,
        notify_evicted,
        ..ServerConfig::default()
    };
    if let Some(turn) = turn {
        info!("Using TURN server {}", turn.url);
        config.ice_servers = vec![IceServerConfig {
            urls: vec![turn.url],
            username: turn.username,
            credential: turn.credential,
        }];
    }

    println!(
        "{} {} {}",
        "📡 pairlink signaling on".green().bold(),
        format!("ws://{bind}/ws").cyan(),
        format!("(capacity {capacity})").dimmed()
    );
    serve(config).await
}
