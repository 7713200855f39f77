use crate::error::SessionError;
use crate::session::state::NegotiationState;
use crate::transport::{ChannelState, MediaKind};
use bytes::Bytes;
use pairlink_core::RoomId;
use tokio::sync::mpsc;

/// Notifications for the application.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(NegotiationState),
    ChannelStateChanged(ChannelState),
    Message(Bytes),
    RemoteTrack { kind: MediaKind },
    /// The server gave this peer's room slot to a newer member.
    Evicted { room_id: RoomId },
    Error(SessionError),
}

pub type SessionEvents = mpsc::UnboundedReceiver<SessionEvent>;
