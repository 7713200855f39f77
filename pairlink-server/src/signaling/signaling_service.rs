use crate::config::ServerConfig;
use crate::room::{ConnectionHandle, Peer, RoomRegistry};
use pairlink_core::{ClientSignal, ConnectionId, IceServerConfig, PeerId, RoomId, ServerSignal};
use std::sync::Arc;
use tracing::{info, warn};

struct SignalingInner {
    registry: RoomRegistry,
    ice_servers: Vec<IceServerConfig>,
    notify_evicted: bool,
}

/// Connection-layer glue between websockets and the [`RoomRegistry`].
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                registry: RoomRegistry::new(config.room_capacity),
                ice_servers: config.ice_servers.clone(),
                notify_evicted: config.notify_evicted,
            }),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.inner.registry
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    /// Register a new socket for `peer_id` in `room_id`. The greeting frames
    /// are queued before the handle moves into the registry.
    pub fn connect(&self, room_id: &RoomId, peer_id: &PeerId, handle: ConnectionHandle) -> ConnectionId {
        let connection_id = ConnectionId::new();

        let greeting = [
            ServerSignal::Welcome {
                peer_id: peer_id.clone(),
                room_id: room_id.clone(),
            },
            ServerSignal::IceConfig {
                ice_servers: self.get_ice_servers(),
            },
        ];
        for signal in greeting {
            if handle.send(signal).is_err() {
                warn!("Connection {} of {} closed before join", connection_id, peer_id);
            }
        }

        let report = self
            .inner
            .registry
            .join(room_id, Peer::new(peer_id.clone(), connection_id, handle));

        for evicted in report.evicted {
            if self.inner.notify_evicted {
                evicted.deliver(ServerSignal::Evicted {
                    room_id: room_id.clone(),
                });
            }
            info!(
                "Peer {} displaced from room '{}' by {}",
                evicted.peer_id, room_id, peer_id
            );
        }

        connection_id
    }

    /// Relay one inbound frame from `peer_id`'s socket. Returns the number of
    /// peers it reached.
    pub fn handle_signal(
        &self,
        room_id: &RoomId,
        peer_id: &PeerId,
        connection_id: ConnectionId,
        signal: ClientSignal,
    ) -> usize {
        let envelope = signal.into_envelope(peer_id.clone());
        self.inner
            .registry
            .relay_from(room_id, connection_id, &envelope)
    }

    pub fn disconnect(&self, room_id: &RoomId, peer_id: &PeerId, connection_id: ConnectionId) {
        if self
            .inner
            .registry
            .disconnect(room_id, peer_id, connection_id)
            .is_none()
        {
            info!(
                "Connection {} of {} was no longer registered in '{}'",
                connection_id, peer_id, room_id
            );
        }
    }
}
