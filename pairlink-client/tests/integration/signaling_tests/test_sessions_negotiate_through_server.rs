use pairlink_client::{
    NegotiationState, SessionConfig, SessionHandle, SignalingConfig, connect_signaling,
};
use pairlink_core::SessionDescription;
use pairlink_server::ServerConfig;
use std::sync::Arc;

use crate::integration::{init_tracing, start_test_server};
use crate::utils::{
    MockTransportFactory, TransportCall, wait_for_calls, wait_for_state, wait_until_member,
};

#[tokio::test]
async fn test_sessions_negotiate_through_server() {
    init_tracing();

    let (addr, service) = start_test_server(ServerConfig::default()).await;
    let url = format!("ws://{addr}");

    let alice_engine = MockTransportFactory::new();
    let (link, signal_rx) = connect_signaling(&SignalingConfig::new(&url, "alice", "r1"))
        .await
        .expect("alice joins");
    let (alice, _alice_events) = SessionHandle::spawn(
        SessionConfig::default(),
        Arc::new(alice_engine.clone()),
        Arc::new(link),
        signal_rx,
    );

    let bob_engine = MockTransportFactory::new();
    let (link, signal_rx) = connect_signaling(&SignalingConfig::new(&url, "bob", "r1"))
        .await
        .expect("bob joins");
    let (bob, _bob_events) = SessionHandle::spawn(
        SessionConfig::default(),
        Arc::new(bob_engine.clone()),
        Arc::new(link),
        signal_rx,
    );
    wait_until_member(&service, "r1", "bob").await;

    alice.start_session().await.expect("alice starts");
    let alice_transport = alice_engine.last();

    wait_for_state(&bob, NegotiationState::Negotiating).await.unwrap();
    wait_for_state(&alice, NegotiationState::Negotiating).await.unwrap();

    let bob_transport = bob_engine.last();
    assert_eq!(
        bob_transport.calls()[0],
        TransportCall::SetRemote(SessionDescription::offer("offer-1"))
    );
    assert!(
        alice_transport
            .calls()
            .contains(&TransportCall::SetRemote(SessionDescription::answer("answer-1")))
    );

    // Each side's gathered candidate reaches the other exactly once.
    wait_for_calls(&bob_transport, |calls| {
        calls.contains(&TransportCall::AddCandidate("host-1".to_owned()))
    })
    .await
    .unwrap();
    wait_for_calls(&alice_transport, |calls| {
        calls.contains(&TransportCall::AddCandidate("host-1".to_owned()))
    })
    .await
    .unwrap();
    assert_eq!(bob_transport.added_candidates(), vec!["host-1".to_owned()]);
    assert_eq!(alice_transport.added_candidates(), vec!["host-1".to_owned()]);
}
