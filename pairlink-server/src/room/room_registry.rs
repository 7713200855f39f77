use crate::room::{JoinReport, Peer, Room};
use dashmap::DashMap;
use pairlink_core::{ConnectionId, PeerId, RoomId, SignalingEnvelope};
use std::sync::Arc;
use tracing::{debug, info};

/// Process-wide map of rooms.
///
/// Each room lives in a `DashMap` entry: joins and leaves hold the entry's
/// write guard, relays hold its read guard for the whole fan-out, so a relay
/// never sees a half-applied eviction.
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<DashMap<RoomId, Room>>,
    capacity: usize,
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admit `peer` into `room_id`, creating the room on first use.
    pub fn join(&self, room_id: &RoomId, peer: Peer) -> JoinReport {
        let mut room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::new(room_id.clone(), self.capacity)
        });

        info!("Peer {} joined room '{}'", peer.peer_id, room_id);
        room.join(peer)
    }

    /// Relay `envelope` to every other member of `room_id`. A missing or
    /// underpopulated room is not an error.
    pub fn relay(&self, room_id: &RoomId, envelope: &SignalingEnvelope) -> usize {
        let Some(room) = self.rooms.get(room_id) else {
            debug!("Relay miss: room '{}' does not exist", room_id);
            return 0;
        };

        let delivered = room.relay(envelope);
        if delivered == 0 {
            debug!(
                "Relay miss: no recipient for {:?} from {} in room '{}'",
                envelope.kind, envelope.sender, room_id
            );
        }
        delivered
    }

    /// Relay on behalf of a socket, checked against its registration under
    /// the same guard. Frames from displaced connections are dropped.
    pub fn relay_from(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        envelope: &SignalingEnvelope,
    ) -> usize {
        let Some(room) = self.rooms.get(room_id) else {
            return 0;
        };

        if !room.is_registered(&envelope.sender, connection_id) {
            debug!(
                "Dropping {:?} from {}: connection {} is no longer a member of '{}'",
                envelope.kind, envelope.sender, connection_id, room_id
            );
            return 0;
        }

        let delivered = room.relay(envelope);
        if delivered == 0 {
            debug!(
                "Relay miss: no recipient for {:?} from {} in room '{}'",
                envelope.kind, envelope.sender, room_id
            );
        }
        delivered
    }

    pub fn leave(&self, room_id: &RoomId, peer_id: &PeerId) -> Option<Peer> {
        let mut room = self.rooms.get_mut(room_id)?;
        let removed = room.leave(peer_id);
        if removed.is_some() {
            info!("Peer {} left room '{}'", peer_id, room_id);
        }
        removed
    }

    /// `leave` scoped to one connection: a refreshed peer's old socket
    /// closing must not remove the new registration.
    pub fn disconnect(
        &self,
        room_id: &RoomId,
        peer_id: &PeerId,
        connection_id: ConnectionId,
    ) -> Option<Peer> {
        let mut room = self.rooms.get_mut(room_id)?;
        let removed = room.disconnect(peer_id, connection_id);
        if removed.is_some() {
            info!("Peer {} left room '{}'", peer_id, room_id);
        }
        removed
    }

    pub fn is_registered(
        &self,
        room_id: &RoomId,
        peer_id: &PeerId,
        connection_id: ConnectionId,
    ) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|room| room.is_registered(peer_id, connection_id))
    }

    /// Member ids of `room_id`, oldest first. Empty if the room is unknown.
    pub fn members(&self, room_id: &RoomId) -> Vec<PeerId> {
        self.rooms
            .get(room_id)
            .map(|room| room.member_ids())
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
