use crate::transport::ChannelState;
use std::fmt;

/// Negotiation progress of one local peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    /// Initiator: offer sent, waiting for the remote answer.
    AwaitingAnswer,
    /// Responder: remote offer applied, local answer being produced.
    AwaitingLocalAnswer,
    /// Descriptions exchanged, ICE candidates flowing.
    Negotiating,
    Connected,
    Closed,
    Failed,
}

impl NegotiationState {
    /// A new session may begin from here.
    pub fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Closed | Self::Failed)
    }

    /// A session exists and owns a transport.
    pub fn is_active(self) -> bool {
        !self.can_start()
    }
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingAnswer => "awaiting answer",
            Self::AwaitingLocalAnswer => "awaiting local answer",
            Self::Negotiating => "negotiating",
            Self::Connected => "connected",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

/// Readiness snapshot published to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: NegotiationState,
    pub role: Option<Role>,
    pub channel: ChannelState,
}

impl SessionStatus {
    /// Application messages may be sent.
    pub fn is_ready(&self) -> bool {
        self.channel == ChannelState::Open
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            state: NegotiationState::Idle,
            role: None,
            channel: ChannelState::Closed,
        }
    }
}
