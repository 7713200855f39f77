use crate::error::SignalingError;
use crate::transport::TransportConfig;
use std::time::Duration;

pub const DEFAULT_CHANNEL_LABEL: &str = "pairlink";
pub const DEFAULT_NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings of one sequencer.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub transport: TransportConfig,
    /// Label of the data channel the initiator opens.
    pub channel_label: String,
    /// A session not `Connected` within this window fails. `None` waits forever.
    pub negotiation_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            channel_label: DEFAULT_CHANNEL_LABEL.to_owned(),
            negotiation_timeout: Some(DEFAULT_NEGOTIATION_TIMEOUT),
        }
    }
}

/// Where and as whom to join the signaling server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalingConfig {
    /// Base url, e.g. `ws://localhost:3001`. A trailing `/ws` is accepted.
    pub server_url: String,
    pub username: String,
    pub room: String,
}

impl SignalingConfig {
    pub fn new(server_url: impl Into<String>, username: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            username: username.into(),
            room: room.into(),
        }
    }

    /// Full websocket url including the join parameters.
    pub fn url(&self) -> Result<String, SignalingError> {
        let base = self.server_url.trim().trim_end_matches('/');
        if !(base.starts_with("ws://") || base.starts_with("wss://")) {
            return Err(SignalingError::InvalidUrl(self.server_url.clone()));
        }
        if self.username.trim().is_empty() || self.room.trim().is_empty() {
            return Err(SignalingError::InvalidUrl(
                "username and room must not be empty".to_owned(),
            ));
        }

        let endpoint = if base.ends_with("/ws") {
            base.to_owned()
        } else {
            format!("{base}/ws")
        };
        Ok(format!(
            "{endpoint}?username={}&roomname={}",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.room)
        ))
    }
}
