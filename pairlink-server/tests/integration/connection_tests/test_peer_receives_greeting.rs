use futures::StreamExt;
use pairlink_core::ServerSignal;
use pairlink_server::ServerConfig;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::integration::{init_tracing, start_test_server};

#[tokio::test]
async fn test_peer_receives_greeting() {
    init_tracing();

    let (addr, _service) = start_test_server(ServerConfig::default()).await;

    let url = format!("ws://{addr}/ws?username=alice&roomname=r1");
    let (mut ws, _) = connect_async(url).await.expect("Failed to connect");

    let mut frames = Vec::new();
    while frames.len() < 2 {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                frames.push(serde_json::from_str::<ServerSignal>(text.as_str()).unwrap())
            }
            Some(Ok(_)) => continue,
            other => panic!("Unexpected websocket item: {:?}", other),
        }
    }

    assert!(matches!(
        &frames[0],
        ServerSignal::Welcome { peer_id, room_id }
            if peer_id.as_str() == "alice" && room_id.as_str() == "r1"
    ));
    assert!(matches!(&frames[1], ServerSignal::IceConfig { ice_servers } if !ice_servers.is_empty()));
}
