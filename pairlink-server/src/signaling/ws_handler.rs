use crate::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use pairlink_core::{ClientSignal, PeerId, RoomId, ServerSignal};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Query string of `/ws?username=..&roomname=..`.
#[derive(Debug, Deserialize)]
pub struct JoinParams {
    pub username: Option<String>,
    pub roomname: Option<String>,
}

impl JoinParams {
    fn into_ids(self) -> Option<(PeerId, RoomId)> {
        let username = self.username.filter(|u| !u.trim().is_empty())?;
        let roomname = self.roomname.filter(|r| !r.trim().is_empty())?;
        Some((PeerId::from(username), RoomId::from(roomname)))
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<JoinParams>,
    State(service): State<SignalingService>,
) -> Response {
    let Some((peer_id, room_id)) = params.into_ids() else {
        warn!("Rejected websocket upgrade without username/roomname");
        return (StatusCode::BAD_REQUEST, "username and roomname are required").into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, peer_id, room_id, service))
}

async fn handle_socket(socket: WebSocket, peer_id: PeerId, room_id: RoomId, service: SignalingService) {
    info!("New WebSocket connection: {} in room '{}'", peer_id, room_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerSignal>();

    let connection_id = service.connect(&room_id, &peer_id, tx);

    // Ends when the registry drops the handle (leave, refresh or eviction),
    // which closes the socket.
    let mut send_task = tokio::spawn(async move {
        while let Some(signal) = rx.recv().await {
            let json = match serde_json::to_string(&signal) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let peer_id = peer_id.clone();
        let room_id = room_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientSignal>(&text) {
                        Ok(signal) => {
                            let kind = signal.kind();
                            let delivered =
                                service.handle_signal(&room_id, &peer_id, connection_id, signal);
                            debug!("{:?} from {} reached {} peer(s)", kind, peer_id, delivered);
                        }
                        Err(e) => warn!("Invalid signal from {}: {}", peer_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    service.disconnect(&room_id, &peer_id, connection_id);
    info!("WebSocket disconnected: {} ({})", peer_id, connection_id);
}
