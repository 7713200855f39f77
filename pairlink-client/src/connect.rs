use crate::config::{SessionConfig, SignalingConfig};
use crate::error::SessionError;
use crate::session::{SessionEvents, SessionHandle};
use crate::signaling::connect_signaling;
use crate::transport::RtcTransportFactory;
use std::sync::Arc;

/// Join a room over websocket signaling and spawn a sequencer backed by the
/// webrtc engine.
pub async fn connect(
    signaling: &SignalingConfig,
    config: SessionConfig,
) -> Result<(SessionHandle, SessionEvents), SessionError> {
    let (link, signal_rx) = connect_signaling(signaling).await?;
    Ok(SessionHandle::spawn(
        config,
        Arc::new(RtcTransportFactory::new()),
        Arc::new(link),
        signal_rx,
    ))
}
