use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::TransportEvents;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use pairlink_core::{IceCandidate, SessionDescription};
use std::sync::Arc;

/// Builds one transport per session, wired to the sequencer's event channel.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(&self, config: &TransportConfig, events: TransportEvents) -> Result<Arc<dyn Transport>>;
}

/// The peer-to-peer engine as seen by the sequencer. Callbacks of the
/// engine never touch negotiation state; they only emit `TransportEvent`s.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn create_data_channel(&self, label: &str) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Send one message over the data channel.
    async fn send(&self, data: Bytes) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
