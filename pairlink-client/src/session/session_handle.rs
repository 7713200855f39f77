use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::session::sequencer::Sequencer;
use crate::session::session_command::SessionCommand;
use crate::session::session_event::SessionEvents;
use crate::session::state::{NegotiationState, SessionStatus};
use crate::signaling::SignalingOutput;
use crate::transport::TransportFactory;
use bytes::Bytes;
use pairlink_core::ServerSignal;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

const COMMAND_CAPACITY: usize = 32;

/// Application-side handle to one sequencer. Clones share the same
/// session; dropping the last clone ends it and stops the sequencer.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    status_rx: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    /// Spawn a sequencer on the current tokio runtime.
    ///
    /// `signal_rx` carries the frames the signaling server sends to this
    /// peer; every outbound envelope goes through `signaling`.
    pub fn spawn(
        config: SessionConfig,
        factory: Arc<dyn TransportFactory>,
        signaling: Arc<dyn SignalingOutput>,
        signal_rx: mpsc::Receiver<ServerSignal>,
    ) -> (Self, SessionEvents) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (status_tx, status_rx) = watch::channel(SessionStatus::default());
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let sequencer = Sequencer::new(
            config, factory, signaling, command_rx, signal_rx, status_tx, event_tx,
        );
        tokio::spawn(sequencer.run());

        (
            Self {
                command_tx,
                status_rx,
            },
            event_rx,
        )
    }

    /// Begin a session as initiator. Resolves once the offer is sent.
    pub async fn start_session(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Start { reply }).await?
    }

    /// Tear the session down. Idempotent.
    pub async fn end_session(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::End { reply }).await
    }

    /// Send over the data channel; fails unless the channel is open.
    pub async fn send_message(&self, data: impl Into<Bytes>) -> Result<(), SessionError> {
        let data = data.into();
        self.request(move |reply| SessionCommand::Send { data, reply })
            .await?
    }

    pub fn status(&self) -> SessionStatus {
        *self.status_rx.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status_rx.clone()
    }

    /// Wait until messages can be sent. Errors if the session fails or
    /// closes first.
    pub async fn wait_until_ready(&self) -> Result<(), SessionError> {
        let mut status_rx = self.status_rx.clone();
        let status = *status_rx
            .wait_for(|s| {
                s.is_ready()
                    || matches!(s.state, NegotiationState::Failed | NegotiationState::Closed)
            })
            .await
            .map_err(|_| SessionError::SequencerStopped)?;

        match status.state {
            _ if status.is_ready() => Ok(()),
            NegotiationState::Failed => Err(SessionError::TransportFailure(
                "session failed before the channel opened".to_owned(),
            )),
            state => Err(SessionError::InvalidState {
                operation: "wait for readiness",
                state,
            }),
        }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, reply_rx) = oneshot::channel();
        self.command_tx
            .send(command(reply))
            .await
            .map_err(|_| SessionError::SequencerStopped)?;
        reply_rx.await.map_err(|_| SessionError::SequencerStopped)
    }
}
