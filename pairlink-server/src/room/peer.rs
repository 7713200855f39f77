use pairlink_core::{ConnectionId, PeerId, ServerSignal};
use tokio::sync::mpsc;
use tracing::warn;

/// Outbound path to one websocket. Owned by the registry while the peer is a
/// room member.
pub type ConnectionHandle = mpsc::UnboundedSender<ServerSignal>;

#[derive(Debug)]
pub struct Peer {
    pub peer_id: PeerId,
    pub connection_id: ConnectionId,
    handle: ConnectionHandle,
}

impl Peer {
    pub fn new(peer_id: PeerId, connection_id: ConnectionId, handle: ConnectionHandle) -> Self {
        Self {
            peer_id,
            connection_id,
            handle,
        }
    }

    /// Queue a frame on the peer's socket. Returns false if the socket task
    /// is already gone.
    pub fn deliver(&self, signal: ServerSignal) -> bool {
        if self.handle.send(signal).is_err() {
            warn!(
                "Attempted to deliver to closed connection {} of {}",
                self.connection_id, self.peer_id
            );
            return false;
        }
        true
    }
}
