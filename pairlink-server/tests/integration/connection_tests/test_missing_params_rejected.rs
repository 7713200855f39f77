use pairlink_server::ServerConfig;
use tokio_tungstenite::connect_async;

use crate::integration::{init_tracing, start_test_server};

#[tokio::test]
async fn test_missing_params_rejected() {
    init_tracing();

    let (addr, service) = start_test_server(ServerConfig::default()).await;

    for query in ["", "?username=alice", "?roomname=r1", "?username=&roomname=r1"] {
        let url = format!("ws://{addr}/ws{query}");
        assert!(
            connect_async(url).await.is_err(),
            "Upgrade with query '{}' should be rejected",
            query
        );
    }

    assert_eq!(service.registry().room_count(), 0);
}
