use anyhow::{Context, Result};
use pairlink_client::{
    NegotiationState, SessionConfig, SessionEvent, SessionEvents, SessionHandle,
};
use pairlink_core::{ClientSignal, PeerId, RoomId, ServerSignal};
use pairlink_server::SignalingService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::mock_signaling::MockSignalingOutput;
use super::mock_transport::{MockTransport, MockTransportFactory, TransportCall};

/// Timeout for an expected state, event or frame (ms).
pub const STATE_TIMEOUT_MS: u64 = 5000;

/// Window in which an unexpected frame would have shown up (ms).
pub const SILENCE_WINDOW_MS: u64 = 200;

/// A sequencer wired to mocks on both sides.
pub struct TestSession {
    pub handle: SessionHandle,
    pub events: SessionEvents,
    pub factory: MockTransportFactory,
    pub signaling: MockSignalingOutput,
    /// Frames the sequencer emitted.
    pub outbound: mpsc::UnboundedReceiver<ClientSignal>,
    /// Frames "from the server".
    signal_tx: mpsc::Sender<ServerSignal>,
}

impl TestSession {
    /// No negotiation timeout unless the test sets one.
    pub fn spawn() -> Self {
        Self::spawn_with(SessionConfig {
            negotiation_timeout: None,
            ..SessionConfig::default()
        })
    }

    pub fn spawn_with(config: SessionConfig) -> Self {
        let factory = MockTransportFactory::new();
        let (signaling, outbound) = MockSignalingOutput::new();
        let (signal_tx, signal_rx) = mpsc::channel(64);

        let (handle, events) = SessionHandle::spawn(
            config,
            Arc::new(factory.clone()),
            Arc::new(signaling.clone()),
            signal_rx,
        );

        Self {
            handle,
            events,
            factory,
            signaling,
            outbound,
            signal_tx,
        }
    }

    pub async fn deliver(&self, signal: ServerSignal) {
        self.signal_tx
            .send(signal)
            .await
            .expect("Sequencer stopped reading signals");
    }

    pub async fn wait_for_state(&self, state: NegotiationState) -> Result<()> {
        wait_for_state(&self.handle, state).await
    }

    pub async fn next_signal(&mut self) -> Result<ClientSignal> {
        tokio::time::timeout(Duration::from_millis(STATE_TIMEOUT_MS), self.outbound.recv())
            .await
            .context("Timeout waiting for an outbound signal")?
            .context("Signaling mock dropped")
    }

    /// Skips events until one matches.
    pub async fn next_event_matching(
        &mut self,
        predicate: impl Fn(&SessionEvent) -> bool,
    ) -> Result<SessionEvent> {
        next_event_matching(&mut self.events, predicate).await
    }
}

pub async fn wait_for_state(handle: &SessionHandle, state: NegotiationState) -> Result<()> {
    let mut status = handle.watch_status();
    tokio::time::timeout(
        Duration::from_millis(STATE_TIMEOUT_MS),
        status.wait_for(|s| s.state == state),
    )
    .await
    .with_context(|| format!("Timeout waiting for state {state} (at {})", handle.status().state))?
    .context("Sequencer stopped")?;
    Ok(())
}

pub async fn next_event_matching(
    events: &mut SessionEvents,
    predicate: impl Fn(&SessionEvent) -> bool,
) -> Result<SessionEvent> {
    tokio::time::timeout(Duration::from_millis(STATE_TIMEOUT_MS), async {
        loop {
            match events.recv().await {
                Some(event) if predicate(&event) => return Ok(event),
                Some(_) => continue,
                None => anyhow::bail!("Event stream ended"),
            }
        }
    })
    .await
    .context("Timeout waiting for session event")?
}

/// Poll a mock transport until its call log satisfies `predicate`.
pub async fn wait_for_calls(
    transport: &MockTransport,
    predicate: impl Fn(&[TransportCall]) -> bool,
) -> Result<()> {
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(STATE_TIMEOUT_MS);

    loop {
        let calls = transport.calls();
        if predicate(&calls) {
            return Ok(());
        }
        if start.elapsed() > timeout {
            anyhow::bail!("Timeout waiting for transport calls (got {:?})", calls);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Poll the server registry until `peer` is a member of `room`.
pub async fn wait_until_member(service: &SignalingService, room: &str, peer: &str) {
    let room_id = RoomId::from(room);
    let peer_id = PeerId::from(peer);
    let start = std::time::Instant::now();

    while !service.registry().members(&room_id).contains(&peer_id) {
        assert!(
            start.elapsed() < Duration::from_millis(STATE_TIMEOUT_MS),
            "Timeout waiting for {peer} to join {room}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
