use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

/// Relay unit. The registry routes on `kind` and `sender` only and never
/// looks inside `payload`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalingEnvelope {
    pub kind: SignalKind,
    pub payload: Value,
    pub sender: PeerId,
}

impl SignalingEnvelope {
    pub fn new(kind: SignalKind, payload: Value, sender: PeerId) -> Self {
        Self {
            kind,
            payload,
            sender,
        }
    }

    /// The frame the other room members receive.
    pub fn to_remote(&self) -> ServerSignal {
        let payload = self.payload.clone();
        match self.kind {
            SignalKind::Offer => ServerSignal::RemoteOffer(payload),
            SignalKind::Answer => ServerSignal::RemoteAnswer(payload),
            SignalKind::Candidate => ServerSignal::RemoteCandidate(payload),
        }
    }
}

/// Frames a peer sends to the signaling server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientSignal {
    Offer(Value),
    Answer(Value),
    Candidate(Value),
}

impl ClientSignal {
    pub fn new(kind: SignalKind, payload: Value) -> Self {
        match kind {
            SignalKind::Offer => Self::Offer(payload),
            SignalKind::Answer => Self::Answer(payload),
            SignalKind::Candidate => Self::Candidate(payload),
        }
    }

    pub fn kind(&self) -> SignalKind {
        match self {
            Self::Offer(_) => SignalKind::Offer,
            Self::Answer(_) => SignalKind::Answer,
            Self::Candidate(_) => SignalKind::Candidate,
        }
    }

    pub fn into_envelope(self, sender: PeerId) -> SignalingEnvelope {
        let kind = self.kind();
        let payload = match self {
            Self::Offer(p) | Self::Answer(p) | Self::Candidate(p) => p,
        };
        SignalingEnvelope::new(kind, payload, sender)
    }
}

/// Frames the signaling server sends to a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerSignal {
    RemoteOffer(Value),
    RemoteAnswer(Value),
    RemoteCandidate(Value),
    Welcome {
        peer_id: PeerId,
        room_id: RoomId,
    },
    IceConfig {
        ice_servers: Vec<IceServerConfig>,
    },
    Evicted {
        room_id: RoomId,
    },
}
