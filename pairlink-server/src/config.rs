use pairlink_core::utils::default_ice_servers;
use pairlink_core::{DEFAULT_ROOM_CAPACITY, IceServerConfig};
use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("room capacity must be at least 1")]
    ZeroCapacity,
}

/// Signaling server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub room_capacity: usize,
    /// Send `evicted` to a member displaced by a newer joiner.
    pub notify_evicted: bool,
    /// Pushed to every peer right after it joins.
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            room_capacity: DEFAULT_ROOM_CAPACITY,
            notify_evicted: false,
            ice_servers: default_ice_servers(),
        }
    }
}

impl ServerConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.room_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(self)
    }
}
