use pairlink_core::{ClientSignal, ServerSignal};
use pairlink_server::ServerConfig;
use serde_json::json;

use crate::integration::{init_tracing, start_test_server};
use crate::utils::{
    SIGNAL_TIMEOUT_MS, SILENCE_WINDOW_MS, TEARDOWN_TIMEOUT_MS, TestClient, wait_for_members,
};

#[tokio::test]
async fn test_third_peer_evicts_oldest() {
    init_tracing();

    let (addr, service) = start_test_server(ServerConfig::default()).await;

    let mut a = TestClient::join(addr, "A", "r1").await.expect("A join");
    let mut b = TestClient::join(addr, "B", "r1").await.expect("B join");
    let mut d = TestClient::join(addr, "D", "r1").await.expect("D join");

    wait_for_members(&service, "r1", &["B", "D"])
        .await
        .expect("A should be evicted");

    // No eviction notice by default: A's socket just ends.
    a.wait_closed(TEARDOWN_TIMEOUT_MS)
        .await
        .expect("Evicted socket should be closed");

    b.send(ClientSignal::Offer(json!({"sdp": "O2"}))).await.unwrap();

    assert_eq!(
        d.recv(SIGNAL_TIMEOUT_MS).await.unwrap(),
        ServerSignal::RemoteOffer(json!({"sdp": "O2"}))
    );
    b.expect_silence(SILENCE_WINDOW_MS).await.unwrap();
}

#[tokio::test]
async fn test_eviction_notice_when_enabled() {
    init_tracing();

    let config = ServerConfig {
        notify_evicted: true,
        ..Default::default()
    };
    let (addr, _service) = start_test_server(config).await;

    let mut a = TestClient::join(addr, "A", "r1").await.expect("A join");
    let _b = TestClient::join(addr, "B", "r1").await.expect("B join");
    let _d = TestClient::join(addr, "D", "r1").await.expect("D join");

    let notice = a.recv(SIGNAL_TIMEOUT_MS).await.expect("A should be told");
    assert!(matches!(notice, ServerSignal::Evicted { room_id } if room_id.as_str() == "r1"));
    a.wait_closed(TEARDOWN_TIMEOUT_MS).await.unwrap();
}
