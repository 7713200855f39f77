use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::session::pending::PendingCandidates;
use crate::session::session_command::SessionCommand;
use crate::session::session_event::SessionEvent;
use crate::session::state::{NegotiationState, Role, SessionStatus};
use crate::signaling::SignalingOutput;
use crate::transport::{
    ChannelState, Transport, TransportEvent, TransportEvents, TransportFactory, TransportState,
};
use bytes::Bytes;
use pairlink_core::{
    ClientSignal, IceCandidate, SdpKind, ServerSignal, SessionDescription, SignalKind,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything one negotiation attempt owns. Only the sequencer's handlers
/// mutate it.
struct Negotiation {
    state: NegotiationState,
    role: Option<Role>,
    channel: ChannelState,
    transport: Option<Arc<dyn Transport>>,
    remote_description_set: bool,
    pending: PendingCandidates,
    deadline: Option<Instant>,
    /// Bumped for every transport so events of a released one can be dropped.
    generation: u64,
}

impl Negotiation {
    fn new() -> Self {
        Self {
            state: NegotiationState::Idle,
            role: None,
            channel: ChannelState::Closed,
            transport: None,
            remote_description_set: false,
            pending: PendingCandidates::default(),
            deadline: None,
            generation: 0,
        }
    }

    fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            role: self.role,
            channel: self.channel,
        }
    }
}

/// Actor driving one local peer through offer/answer/candidate exchange.
pub(crate) struct Sequencer {
    config: SessionConfig,
    factory: Arc<dyn TransportFactory>,
    signaling: Arc<dyn SignalingOutput>,
    command_rx: mpsc::Receiver<SessionCommand>,
    signal_rx: Option<mpsc::Receiver<ServerSignal>>,
    transport_rx: mpsc::UnboundedReceiver<(u64, TransportEvent)>,
    transport_tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
    status_tx: watch::Sender<SessionStatus>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    negotiation: Negotiation,
}

impl Sequencer {
    pub(crate) fn new(
        config: SessionConfig,
        factory: Arc<dyn TransportFactory>,
        signaling: Arc<dyn SignalingOutput>,
        command_rx: mpsc::Receiver<SessionCommand>,
        signal_rx: mpsc::Receiver<ServerSignal>,
        status_tx: watch::Sender<SessionStatus>,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();

        Self {
            config,
            factory,
            signaling,
            command_rx,
            signal_rx: Some(signal_rx),
            transport_rx,
            transport_tx,
            status_tx,
            event_tx,
            negotiation: Negotiation::new(),
        }
    }

    pub(crate) async fn run(mut self) {
        info!("Session sequencer started");

        loop {
            // Remote frames and engine events queued before a command are
            // handled before it.
            tokio::select! {
                biased;

                signal = recv_or_pending(&mut self.signal_rx) => {
                    match signal {
                        Some(s) => self.handle_signal(s).await,
                        None => {
                            warn!("Signaling link closed; no further remote frames");
                            self.signal_rx = None;
                        }
                    }
                }

                Some((generation, event)) = self.transport_rx.recv() => {
                    self.handle_transport_event(generation, event).await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All session handles dropped. Shutting down sequencer.");
                            break;
                        }
                    }
                }

                _ = sleep_until_opt(self.negotiation.deadline) => {
                    self.on_deadline().await;
                }
            }
        }

        self.end_session().await;
        info!("Session sequencer finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Start { reply } => {
                let result = self.start_session().await;
                let _ = reply.send(result);
            }
            SessionCommand::End { reply } => {
                self.end_session().await;
                let _ = reply.send(());
            }
            SessionCommand::Send { data, reply } => {
                let result = self.send_message(data).await;
                let _ = reply.send(result);
            }
        }
    }

    async fn handle_signal(&mut self, signal: ServerSignal) {
        match signal {
            ServerSignal::RemoteOffer(payload) => self.handle_remote_offer(payload).await,
            ServerSignal::RemoteAnswer(payload) => self.handle_remote_answer(payload).await,
            ServerSignal::RemoteCandidate(payload) => self.handle_remote_candidate(payload).await,
            ServerSignal::Welcome { peer_id, room_id } => {
                info!("Joined room '{}' as {}", room_id, peer_id);
            }
            ServerSignal::IceConfig { ice_servers } => {
                if ice_servers.is_empty() {
                    debug!("Server sent an empty ICE config; keeping local servers");
                } else {
                    info!("Received ICE config: {} server(s)", ice_servers.len());
                    self.config.transport.ice_servers = ice_servers;
                }
            }
            ServerSignal::Evicted { room_id } => {
                warn!("Evicted from room '{}' by a newer peer", room_id);
                self.emit(SessionEvent::Evicted { room_id });
            }
        }
    }

    async fn handle_transport_event(&mut self, generation: u64, event: TransportEvent) {
        if generation != self.negotiation.generation || self.negotiation.transport.is_none() {
            debug!("Dropping event of released transport {}: {:?}", generation, event);
            return;
        }

        match event {
            TransportEvent::CandidateDiscovered(candidate) => {
                let payload = match serde_json::to_value(&candidate) {
                    Ok(payload) => payload,
                    Err(e) => {
                        error!("Failed to serialize local candidate: {}", e);
                        return;
                    }
                };
                if let Err(e) = self.signaling.send_signal(ClientSignal::Candidate(payload)).await {
                    warn!("Failed to relay local candidate: {}", e);
                }
            }
            TransportEvent::ConnectionStateChanged(state) => self.on_connection_state(state).await,
            TransportEvent::ChannelStateChanged(channel) => self.set_channel(channel),
            TransportEvent::IncomingChannel { label } => {
                info!("Remote peer opened channel '{}'", label);
            }
            TransportEvent::Message(data) => self.emit(SessionEvent::Message(data)),
            TransportEvent::RemoteTrack { kind } => {
                info!("Remote {:?} track received", kind);
                self.emit(SessionEvent::RemoteTrack { kind });
            }
        }
    }

    async fn start_session(&mut self) -> Result<(), SessionError> {
        let state = self.negotiation.state;
        if !state.can_start() {
            warn!("Rejected start_session while {}", state);
            return Err(SessionError::InvalidState {
                operation: "start a session",
                state,
            });
        }

        info!("Starting session as initiator");
        // Nothing received before our own offer can belong to this session.
        self.negotiation.pending.clear();

        if let Err(err) = self.initiate().await {
            self.fail(err.clone()).await;
            return Err(err);
        }
        Ok(())
    }

    async fn initiate(&mut self) -> Result<(), SessionError> {
        let transport = self.create_transport(Role::Initiator).await?;
        transport
            .create_data_channel(&self.config.channel_label)
            .await
            .map_err(SessionError::transport)?;
        let offer = transport.create_offer().await.map_err(SessionError::transport)?;
        transport
            .set_local_description(offer.clone())
            .await
            .map_err(SessionError::transport)?;

        self.set_state(NegotiationState::AwaitingAnswer);
        self.send_description(SignalKind::Offer, &offer).await
    }

    async fn handle_remote_offer(&mut self, payload: Value) {
        let state = self.negotiation.state;
        if state.is_active() {
            warn!("Ignoring remote offer while {}", state);
            return;
        }
        let Some(offer) = parse_description(SignalKind::Offer, payload, SdpKind::Offer) else {
            return;
        };

        info!("Received offer. Answering as responder.");
        if let Err(err) = self.respond(offer).await {
            self.fail(err).await;
        }
    }

    async fn respond(&mut self, offer: SessionDescription) -> Result<(), SessionError> {
        let transport = self.create_transport(Role::Responder).await?;
        transport
            .set_remote_description(offer)
            .await
            .map_err(SessionError::transport)?;
        self.negotiation.remote_description_set = true;
        self.set_state(NegotiationState::AwaitingLocalAnswer);
        self.flush_pending(&transport).await;

        let answer = transport.create_answer().await.map_err(SessionError::transport)?;
        transport
            .set_local_description(answer.clone())
            .await
            .map_err(SessionError::transport)?;
        self.send_description(SignalKind::Answer, &answer).await?;
        self.set_state(NegotiationState::Negotiating);
        Ok(())
    }

    async fn handle_remote_answer(&mut self, payload: Value) {
        let state = self.negotiation.state;
        if state != NegotiationState::AwaitingAnswer {
            warn!("Ignoring remote answer while {}", state);
            return;
        }
        let Some(answer) = parse_description(SignalKind::Answer, payload, SdpKind::Answer) else {
            return;
        };
        let Some(transport) = self.negotiation.transport.clone() else {
            return;
        };

        if let Err(e) = transport.set_remote_description(answer).await {
            self.fail(SessionError::transport(e)).await;
            return;
        }
        self.negotiation.remote_description_set = true;
        self.set_state(NegotiationState::Negotiating);
        self.flush_pending(&transport).await;
    }

    async fn handle_remote_candidate(&mut self, payload: Value) {
        let candidate: IceCandidate = match parse_payload(SignalKind::Candidate, payload) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };

        match self.negotiation.transport.clone() {
            Some(transport) if self.negotiation.remote_description_set => {
                apply_candidate(&transport, candidate).await;
            }
            // Trickle of a session that already ended.
            None if matches!(
                self.negotiation.state,
                NegotiationState::Closed | NegotiationState::Failed
            ) =>
            {
                debug!("Dropping remote candidate while {}", self.negotiation.state);
            }
            _ => {
                self.negotiation.pending.push(candidate);
                debug!(
                    "Buffered remote candidate ({} pending)",
                    self.negotiation.pending.len()
                );
            }
        }
    }

    async fn on_connection_state(&mut self, state: TransportState) {
        match state {
            TransportState::Connected => {
                let current = self.negotiation.state;
                if current.is_active() && current != NegotiationState::Connected {
                    self.negotiation.deadline = None;
                    self.set_state(NegotiationState::Connected);
                }
            }
            TransportState::Failed => {
                self.fail(SessionError::TransportFailure(
                    "peer connection failed".to_owned(),
                ))
                .await;
            }
            TransportState::Closed => {
                info!("Peer connection closed by the remote side");
                self.release_transport().await;
                self.set_state(NegotiationState::Closed);
            }
            TransportState::Disconnected => {
                warn!("Peer connection disconnected; waiting for it to recover");
            }
            TransportState::New | TransportState::Connecting => {
                debug!("Peer connection state: {:?}", state);
            }
        }
    }

    async fn on_deadline(&mut self) {
        self.negotiation.deadline = None;
        let secs = self
            .config
            .negotiation_timeout
            .map(|t| t.as_secs())
            .unwrap_or_default();
        self.fail(SessionError::TransportFailure(format!(
            "negotiation timed out after {secs}s"
        )))
        .await;
    }

    async fn send_message(&mut self, data: Bytes) -> Result<(), SessionError> {
        let channel = self.negotiation.channel;
        if channel != ChannelState::Open {
            return Err(SessionError::ChannelNotOpen(channel));
        }
        let Some(transport) = self.negotiation.transport.clone() else {
            return Err(SessionError::ChannelNotOpen(ChannelState::Closed));
        };
        transport
            .send(data)
            .await
            .map_err(|e| SessionError::SendFailed(format!("{e:#}")))
    }

    /// Safe from any state; a no-op unless a session is active.
    async fn end_session(&mut self) {
        let state = self.negotiation.state;
        if !state.is_active() {
            debug!("end_session ignored while {}", state);
            return;
        }

        info!("Ending session");
        self.release_transport().await;
        self.set_state(NegotiationState::Closed);
    }

    async fn fail(&mut self, err: SessionError) {
        error!("Session failed: {}", err);
        self.release_transport().await;
        self.set_state(NegotiationState::Failed);
        self.emit(SessionEvent::Error(err));
    }

    async fn create_transport(&mut self, role: Role) -> Result<Arc<dyn Transport>, SessionError> {
        self.negotiation.generation += 1;
        let events = TransportEvents::new(self.negotiation.generation, self.transport_tx.clone());
        let transport = self
            .factory
            .create(&self.config.transport, events)
            .await
            .map_err(SessionError::transport)?;

        let negotiation = &mut self.negotiation;
        negotiation.transport = Some(transport.clone());
        negotiation.role = Some(role);
        negotiation.remote_description_set = false;
        negotiation.deadline = self.config.negotiation_timeout.map(|t| Instant::now() + t);
        self.set_channel(ChannelState::Connecting);
        Ok(transport)
    }

    async fn release_transport(&mut self) {
        let negotiation = &mut self.negotiation;
        negotiation.pending.clear();
        negotiation.deadline = None;
        negotiation.remote_description_set = false;

        if let Some(transport) = negotiation.transport.take() {
            if let Err(e) = transport.close().await {
                warn!("Failed to close transport: {:#}", e);
            }
        }
        self.set_channel(ChannelState::Closed);
    }

    async fn flush_pending(&mut self, transport: &Arc<dyn Transport>) {
        let pending = self.negotiation.pending.take_all();
        if !pending.is_empty() {
            debug!("Applying {} buffered candidate(s)", pending.len());
        }
        for candidate in pending {
            apply_candidate(transport, candidate).await;
        }
    }

    async fn send_description(
        &self,
        kind: SignalKind,
        description: &SessionDescription,
    ) -> Result<(), SessionError> {
        let payload = serde_json::to_value(description).map_err(|e| SessionError::MalformedPayload {
            kind,
            reason: e.to_string(),
        })?;
        self.signaling
            .send_signal(ClientSignal::new(kind, payload))
            .await?;
        debug!("Sent {:?}", kind);
        Ok(())
    }

    fn set_state(&mut self, state: NegotiationState) {
        let previous = self.negotiation.state;
        if previous == state {
            return;
        }
        info!("Negotiation state: {} -> {}", previous, state);
        self.negotiation.state = state;
        self.publish();
        self.emit(SessionEvent::StateChanged(state));
    }

    fn set_channel(&mut self, channel: ChannelState) {
        if self.negotiation.channel == channel {
            return;
        }
        debug!("Channel state: {} -> {}", self.negotiation.channel, channel);
        self.negotiation.channel = channel;
        self.publish();
        self.emit(SessionEvent::ChannelStateChanged(channel));
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.negotiation.status());
    }

    fn emit(&self, event: SessionEvent) {
        // The application may not listen for events at all.
        let _ = self.event_tx.send(event);
    }
}

/// Add a remote candidate. Failures only affect that candidate.
async fn apply_candidate(transport: &Arc<dyn Transport>, candidate: IceCandidate) {
    if let Err(e) = transport.add_candidate(candidate).await {
        warn!("Failed to add ICE candidate: {:#}", e);
    }
}

fn parse_payload<T: DeserializeOwned>(kind: SignalKind, payload: Value) -> Result<T, SessionError> {
    serde_json::from_value(payload).map_err(|e| SessionError::MalformedPayload {
        kind,
        reason: e.to_string(),
    })
}

fn parse_description(kind: SignalKind, payload: Value, expected: SdpKind) -> Option<SessionDescription> {
    match parse_payload::<SessionDescription>(kind, payload) {
        Ok(description) if description.kind == expected => Some(description),
        Ok(description) => {
            warn!("Dropping {:?} frame carrying a {:?} description", kind, description.kind);
            None
        }
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

async fn recv_or_pending<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
