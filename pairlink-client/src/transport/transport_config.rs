use pairlink_core::IceServerConfig;
use pairlink_core::utils::default_ice_servers;

/// Which media the peer connection negotiates besides the data channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaOptions {
    pub audio: bool,
    pub video: bool,
}

/// Settings for one peer connection.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub media: MediaOptions,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: default_ice_servers(),
            media: MediaOptions::default(),
        }
    }
}
