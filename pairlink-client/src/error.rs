use crate::session::NegotiationState;
use crate::transport::ChannelState;
use pairlink_core::SignalKind;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignalingError {
    #[error("invalid signaling url: {0}")]
    InvalidUrl(String),

    #[error("failed to connect to signaling server: {0}")]
    Connect(String),

    #[error("signaling connection closed")]
    Closed,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The operation does not fit the current negotiation state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: NegotiationState,
    },

    #[error("data channel is {0}, not open")]
    ChannelNotOpen(ChannelState),

    /// Unrecoverable engine error or negotiation timeout. The session is
    /// `Failed` and must be restarted.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    #[error("failed to send message: {0}")]
    SendFailed(String),

    #[error("malformed {kind:?} payload: {reason}")]
    MalformedPayload { kind: SignalKind, reason: String },

    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error("session sequencer has stopped")]
    SequencerStopped,
}

impl SessionError {
    pub(crate) fn transport(err: anyhow::Error) -> Self {
        Self::TransportFailure(format!("{err:#}"))
    }
}
