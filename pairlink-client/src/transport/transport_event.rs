use bytes::Bytes;
use pairlink_core::IceCandidate;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// Overall connection state reported by the transport engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Ready state of the data channel, tracked apart from the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

/// Callbacks of the transport engine, funneled into the sequencer's loop.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Local ICE candidate to forward to the remote peer.
    CandidateDiscovered(IceCandidate),
    ConnectionStateChanged(TransportState),
    ChannelStateChanged(ChannelState),
    /// The remote side opened a data channel (responder side).
    IncomingChannel { label: String },
    Message(Bytes),
    RemoteTrack { kind: MediaKind },
}

/// Event sender handed to one transport. Events carry the generation of the
/// session that created the transport so late callbacks of a torn-down
/// transport can be told apart.
#[derive(Debug, Clone)]
pub struct TransportEvents {
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
}

impl TransportEvents {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, TransportEvent)>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Never blocks: the sequencer may be awaiting this same engine.
    pub fn emit(&self, event: TransportEvent) {
        if self.tx.send((self.generation, event)).is_err() {
            debug!("Dropping transport event of generation {}: sequencer gone", self.generation);
        }
    }
}
