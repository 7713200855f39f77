use crate::error::SignalingError;
use async_trait::async_trait;
use pairlink_core::ClientSignal;

/// Outbound half of the signaling link. The sequencer emits every offer,
/// answer and candidate through it, in order.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    async fn send_signal(&self, signal: ClientSignal) -> Result<(), SignalingError>;
}
