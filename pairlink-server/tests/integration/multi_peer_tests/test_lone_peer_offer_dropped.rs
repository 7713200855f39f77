use pairlink_core::ClientSignal;
use pairlink_server::ServerConfig;
use serde_json::json;

use crate::integration::{init_tracing, start_test_server};
use crate::utils::{SILENCE_WINDOW_MS, TestClient};

#[tokio::test]
async fn test_lone_peer_offer_dropped() {
    init_tracing();

    let (addr, _service) = start_test_server(ServerConfig::default()).await;

    let mut c = TestClient::join(addr, "C", "r2").await.expect("C join");
    let mut elsewhere = TestClient::join(addr, "X", "r1").await.expect("X join");

    c.send(ClientSignal::Offer(json!({"sdp": "O1"}))).await.unwrap();

    c.expect_silence(SILENCE_WINDOW_MS).await.expect("C gets nothing back");
    elsewhere
        .expect_silence(SILENCE_WINDOW_MS)
        .await
        .expect("Other rooms get nothing");

    // The socket stays usable after a dropped relay.
    c.send(ClientSignal::Candidate(json!({"candidate": "c1"}))).await.unwrap();
}
