use crate::config::SignalingConfig;
use crate::error::SignalingError;
use crate::signaling::signaling_output::SignalingOutput;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use pairlink_core::{ClientSignal, ServerSignal};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Capacity of the inbound frame queue.
const INBOUND_CAPACITY: usize = 64;

/// Websocket connection to the signaling server. Dropping every clone
/// closes the socket.
#[derive(Debug, Clone)]
pub struct WsSignalingLink {
    tx: mpsc::UnboundedSender<ClientSignal>,
}

#[async_trait]
impl SignalingOutput for WsSignalingLink {
    async fn send_signal(&self, signal: ClientSignal) -> Result<(), SignalingError> {
        self.tx.send(signal).map_err(|_| SignalingError::Closed)
    }
}

/// Join the room described by `config`. Returns the outbound link and the
/// stream of frames the server sends to this peer.
pub async fn connect_signaling(
    config: &SignalingConfig,
) -> Result<(WsSignalingLink, mpsc::Receiver<ServerSignal>), SignalingError> {
    let url = config.url()?;
    let (ws, _) = connect_async(url.as_str())
        .await
        .map_err(|e| SignalingError::Connect(e.to_string()))?;
    info!("Connected to signaling server as {} in room '{}'", config.username, config.room);

    let (mut sink, mut stream) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientSignal>();
    let (in_tx, in_rx) = mpsc::channel::<ServerSignal>(INBOUND_CAPACITY);

    tokio::spawn(async move {
        while let Some(signal) = out_rx.recv().await {
            let json = match serde_json::to_string(&signal) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal message: {}", e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(json.into())).await {
                warn!("Signaling socket write failed: {}", e);
                return;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
        debug!("Signaling writer finished");
    });

    tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerSignal>(text.as_str()) {
                    Ok(signal) => {
                        if in_tx.send(signal).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Invalid frame from signaling server: {}", e),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Signaling socket error: {}", e);
                    break;
                }
            }
        }
        info!("Signaling connection closed");
    });

    Ok((WsSignalingLink { tx: out_tx }, in_rx))
}
