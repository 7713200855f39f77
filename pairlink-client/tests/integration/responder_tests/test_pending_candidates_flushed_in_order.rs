use pairlink_client::NegotiationState;
use pairlink_core::{ServerSignal, SessionDescription};
use serde_json::json;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{SILENCE_WINDOW_MS, TestSession, TransportCall, wait_for_calls};

fn candidate(name: &str) -> ServerSignal {
    ServerSignal::RemoteCandidate(json!({"candidate": name, "sdpMid": "0", "sdpMLineIndex": 0}))
}

#[tokio::test]
async fn test_initiator_buffers_until_answer() {
    init_tracing();

    let session = TestSession::spawn();
    session.handle.start_session().await.unwrap();
    let transport = session.factory.last();

    session.deliver(candidate("c1")).await;
    session.deliver(candidate("c2")).await;
    session
        .deliver(ServerSignal::RemoteAnswer(json!({"type": "answer", "sdp": "A1"})))
        .await;
    session.deliver(candidate("c3")).await;

    wait_for_calls(&transport, |calls| {
        calls
            .iter()
            .filter(|c| matches!(c, TransportCall::AddCandidate(_)))
            .count()
            == 3
    })
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(SILENCE_WINDOW_MS)).await;

    assert_eq!(transport.added_candidates(), vec!["c1", "c2", "c3"]);

    // Nothing is applied before the remote description.
    let calls = transport.calls();
    let set_remote = calls
        .iter()
        .position(|c| *c == TransportCall::SetRemote(SessionDescription::answer("A1")))
        .expect("Answer applied");
    let first_add = calls
        .iter()
        .position(|c| matches!(c, TransportCall::AddCandidate(_)))
        .unwrap();
    assert!(set_remote < first_add);
}

#[tokio::test]
async fn test_responder_buffers_candidates_before_offer() {
    init_tracing();

    let session = TestSession::spawn();
    session.deliver(candidate("early-1")).await;
    session.deliver(candidate("early-2")).await;
    session
        .deliver(ServerSignal::RemoteOffer(json!({"type": "offer", "sdp": "O1"})))
        .await;

    session.wait_for_state(NegotiationState::Negotiating).await.unwrap();
    let transport = session.factory.last();
    assert_eq!(transport.added_candidates(), vec!["early-1", "early-2"]);

    let calls = transport.calls();
    assert_eq!(calls[0], TransportCall::SetRemote(SessionDescription::offer("O1")));
    assert_eq!(calls[1], TransportCall::AddCandidate("early-1".to_owned()));
    assert_eq!(calls[2], TransportCall::AddCandidate("early-2".to_owned()));
    assert_eq!(calls[3], TransportCall::CreateAnswer);
}

#[tokio::test]
async fn test_candidates_after_close_not_carried_over() {
    init_tracing();

    let session = TestSession::spawn();
    session.handle.start_session().await.unwrap();
    session.handle.end_session().await.unwrap();

    // Trickle of the ended session arrives late.
    session.deliver(candidate("stale-1")).await;
    session.deliver(candidate("stale-2")).await;
    session
        .deliver(ServerSignal::RemoteOffer(json!({"type": "offer", "sdp": "O2"})))
        .await;
    session.deliver(candidate("fresh")).await;

    session.wait_for_state(NegotiationState::Negotiating).await.unwrap();
    let transport = session.factory.last();
    wait_for_calls(&transport, |calls| {
        calls.contains(&TransportCall::AddCandidate("fresh".to_owned()))
    })
    .await
    .unwrap();

    assert_eq!(session.factory.created_count(), 2);
    assert_eq!(transport.added_candidates(), vec!["fresh"]);
}
