use pairlink_client::{NegotiationState, Role};
use pairlink_core::{ClientSignal, SessionDescription, SignalKind};

use crate::integration::init_tracing;
use crate::utils::{TestSession, TransportCall};

#[tokio::test]
async fn test_start_emits_single_offer() {
    init_tracing();

    let mut session = TestSession::spawn();
    session.handle.start_session().await.expect("start from Idle");

    let status = session.handle.status();
    assert_eq!(status.state, NegotiationState::AwaitingAnswer);
    assert_eq!(status.role, Some(Role::Initiator));

    let first = session.next_signal().await.unwrap();
    let ClientSignal::Offer(payload) = first else {
        panic!("First frame must be the offer, got {:?}", first);
    };
    let offer: SessionDescription = serde_json::from_value(payload).unwrap();
    assert_eq!(offer, SessionDescription::offer("offer-1"));

    // Locally gathered candidates follow the offer.
    let second = session.next_signal().await.unwrap();
    assert_eq!(second.kind(), SignalKind::Candidate);
    assert_eq!(session.signaling.count(SignalKind::Offer).await, 1);

    let transport = session.factory.last();
    assert_eq!(
        transport.calls()[..3],
        [
            TransportCall::CreateDataChannel("pairlink".to_owned()),
            TransportCall::CreateOffer,
            TransportCall::SetLocal(SessionDescription::offer("offer-1")),
        ]
    );
}
