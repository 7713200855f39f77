
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::Level;

use pairlink_server::{ServerConfig, SignalingService, router};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Serve the signaling router on an ephemeral port. The returned service
/// shares its registry with the running server.
pub async fn start_test_server(config: ServerConfig) -> (SocketAddr, SignalingService) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    let service = SignalingService::new(&config);
    let app = router(service.clone());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, service)
}
