use pairlink_client::{NegotiationState, TransportEvent, TransportState};
use pairlink_core::{IceCandidate, SignalKind};
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{SILENCE_WINDOW_MS, TestSession};

#[tokio::test]
async fn test_stale_transport_events_ignored() {
    init_tracing();

    let session = TestSession::spawn();
    session.handle.start_session().await.unwrap();
    let first = session.factory.last();
    session.handle.end_session().await.unwrap();

    session.handle.start_session().await.unwrap();
    tokio::time::sleep(Duration::from_millis(SILENCE_WINDOW_MS)).await;
    let candidates_before = session.signaling.count(SignalKind::Candidate).await;

    // Late callbacks of the released engine.
    first.emit(TransportEvent::ConnectionStateChanged(TransportState::Connected));
    first.emit(TransportEvent::CandidateDiscovered(IceCandidate::new("late")));
    tokio::time::sleep(Duration::from_millis(SILENCE_WINDOW_MS)).await;

    assert_eq!(session.handle.status().state, NegotiationState::AwaitingAnswer);
    assert_eq!(
        session.signaling.count(SignalKind::Candidate).await,
        candidates_before
    );
}
