use crate::room::peer::Peer;
use pairlink_core::{ConnectionId, PeerId, RoomId, SignalingEnvelope};
use std::collections::VecDeque;
use tracing::{debug, info};

/// What a join did to the room besides admitting the new peer.
#[derive(Debug, Default)]
pub struct JoinReport {
    /// Connection id of a previous registration under the same `PeerId`.
    pub replaced: Option<ConnectionId>,
    /// Members pushed out to stay within capacity, oldest first.
    pub evicted: Vec<Peer>,
}

/// A bounded, join-ordered set of peers. Front is the oldest member.
#[derive(Debug)]
pub struct Room {
    room_id: RoomId,
    members: VecDeque<Peer>,
    capacity: usize,
}

impl Room {
    pub fn new(room_id: RoomId, capacity: usize) -> Self {
        Self {
            room_id,
            members: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member ids, oldest first.
    pub fn member_ids(&self) -> Vec<PeerId> {
        self.members.iter().map(|m| m.peer_id.clone()).collect()
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.members.iter().any(|m| &m.peer_id == peer_id)
    }

    /// True if `peer_id` is a member through exactly this connection.
    pub fn is_registered(&self, peer_id: &PeerId, connection_id: ConnectionId) -> bool {
        self.members
            .iter()
            .any(|m| &m.peer_id == peer_id && m.connection_id == connection_id)
    }

    /// Admit `peer`. A known `PeerId` has its old registration replaced and
    /// moves to the newest position; a new one evicts the oldest members
    /// while the room is full.
    pub fn join(&mut self, peer: Peer) -> JoinReport {
        let mut report = JoinReport::default();

        if let Some(pos) = self.members.iter().position(|m| m.peer_id == peer.peer_id) {
            if let Some(previous) = self.members.remove(pos) {
                info!(
                    "Peer {} re-joined room '{}', replacing connection {}",
                    peer.peer_id, self.room_id, previous.connection_id
                );
                report.replaced = Some(previous.connection_id);
            }
        }

        while self.members.len() >= self.capacity {
            let Some(oldest) = self.members.pop_front() else {
                break;
            };
            info!(
                "Room '{}' is full, evicting oldest member {}",
                self.room_id, oldest.peer_id
            );
            report.evicted.push(oldest);
        }

        self.members.push_back(peer);
        report
    }

    /// Remove `peer_id` whatever connection it is registered through.
    pub fn leave(&mut self, peer_id: &PeerId) -> Option<Peer> {
        let pos = self.members.iter().position(|m| &m.peer_id == peer_id)?;
        self.members.remove(pos)
    }

    /// Remove `peer_id` only if it is still registered through `connection_id`.
    pub fn disconnect(&mut self, peer_id: &PeerId, connection_id: ConnectionId) -> Option<Peer> {
        let pos = self
            .members
            .iter()
            .position(|m| &m.peer_id == peer_id && m.connection_id == connection_id)?;
        self.members.remove(pos)
    }

    /// Deliver `envelope` to every member except its sender. Returns the
    /// number of deliveries.
    pub fn relay(&self, envelope: &SignalingEnvelope) -> usize {
        if self.members.len() < 2 {
            return 0;
        }

        let mut delivered = 0;
        for member in self.members.iter().filter(|m| m.peer_id != envelope.sender) {
            if member.deliver(envelope.to_remote()) {
                debug!(
                    "Relayed {:?} from {} to {} in room '{}'",
                    envelope.kind, envelope.sender, member.peer_id, self.room_id
                );
                delivered += 1;
            }
        }
        delivered
    }
}
