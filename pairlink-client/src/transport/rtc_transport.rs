use crate::transport::transport::{Transport, TransportFactory};
use crate::transport::transport_config::{MediaOptions, TransportConfig};
use crate::transport::transport_event::{
    ChannelState, MediaKind, TransportEvent, TransportEvents, TransportState,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use pairlink_core::{IceCandidate, IceServerConfig, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::{RTCRtpTransceiver, RTCRtpTransceiverInit};
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::track::track_remote::TrackRemote;

/// Transport engine backed by webrtc-rs.
#[derive(Debug, Default, Clone)]
pub struct RtcTransportFactory;

impl RtcTransportFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(&self, config: &TransportConfig, events: TransportEvents) -> Result<Arc<dyn Transport>> {
        let transport = RtcTransport::new(config, events).await?;
        Ok(Arc::new(transport))
    }
}

type SharedChannel = Arc<Mutex<Option<Arc<RTCDataChannel>>>>;

pub struct RtcTransport {
    peer_connection: Arc<RTCPeerConnection>,
    channel: SharedChannel,
    events: TransportEvents,
}

impl RtcTransport {
    pub async fn new(config: &TransportConfig, events: TransportEvents) -> Result<Self> {
        // Codecs are registered even for data-only sessions.
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .context("Failed to register codecs")?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .context("Failed to register interceptors")?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config.ice_servers.iter().map(to_rtc_ice_server).collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        add_receive_transceivers(&peer_connection, config.media).await?;

        let channel: SharedChannel = Arc::new(Mutex::new(None));

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let events = state_events.clone();
            Box::pin(async move {
                info!("Peer connection state changed (generation {}): {}", events.generation(), s);
                if let Some(state) = map_connection_state(s) {
                    events.emit(TransportEvent::ConnectionStateChanged(state));
                }
            })
        }));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            Box::pin(async move {
                // `None` marks the end of gathering.
                let Some(candidate) = c else { return };
                match candidate.to_json() {
                    Ok(init) => {
                        events.emit(TransportEvent::CandidateDiscovered(from_rtc_candidate(init)));
                    }
                    Err(e) => warn!("Failed to serialize local ICE candidate: {}", e),
                }
            })
        }));

        let dc_events = events.clone();
        let dc_slot = channel.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let events = dc_events.clone();
            let slot = dc_slot.clone();
            Box::pin(async move {
                debug!("Remote opened DataChannel '{}'", dc.label());
                wire_channel(&dc, &events);
                *slot.lock().await = Some(dc.clone());
                events
                    .emit(TransportEvent::IncomingChannel {
                        label: dc.label().to_owned(),
                    });
            })
        }));

        let track_events = events.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();
                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => MediaKind::Audio,
                        RTPCodecType::Video => MediaKind::Video,
                        _ => return,
                    };
                    events.emit(TransportEvent::RemoteTrack { kind });
                })
            },
        ));

        Ok(Self {
            peer_connection,
            channel,
            events,
        })
    }
}

#[async_trait]
impl Transport for RtcTransport {
    async fn create_data_channel(&self, label: &str) -> Result<()> {
        let dc = self
            .peer_connection
            .create_data_channel(label, None)
            .await
            .with_context(|| format!("Failed to create DataChannel '{label}'"))?;
        wire_channel(&dc, &self.events);
        *self.channel.lock().await = Some(dc);
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("Failed to create offer")?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create answer")?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(description)?;
        self.peer_connection
            .set_local_description(desc)
            .await
            .context("Failed to set local description")?;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let desc = to_rtc_description(description)?;
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    async fn add_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.peer_connection
            .add_ice_candidate(to_rtc_candidate(candidate))
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn send(&self, data: Bytes) -> Result<()> {
        let Some(dc) = self.channel.lock().await.clone() else {
            anyhow::bail!("No DataChannel on this connection");
        };
        dc.send(&data).await.context("DataChannel send failed")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let channel = self.channel.lock().await.take();
        if let Some(dc) = channel
            && let Err(e) = dc.close().await
        {
            debug!("DataChannel close: {}", e);
        }
        self.peer_connection
            .close()
            .await
            .context("Failed to close peer connection")?;
        Ok(())
    }
}

/// Route the channel's callbacks into the event stream.
fn wire_channel(dc: &Arc<RTCDataChannel>, events: &TransportEvents) {
    let open_events = events.clone();
    let label = dc.label().to_owned();
    dc.on_open(Box::new(move || {
        let events = open_events.clone();
        let label = label.clone();
        Box::pin(async move {
            info!("DataChannel '{}' open", label);
            events.emit(TransportEvent::ChannelStateChanged(ChannelState::Open));
        })
    }));

    let close_events = events.clone();
    dc.on_close(Box::new(move || {
        let events = close_events.clone();
        Box::pin(async move {
            events.emit(TransportEvent::ChannelStateChanged(ChannelState::Closed));
        })
    }));

    let msg_events = events.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let events = msg_events.clone();
        Box::pin(async move {
            events.emit(TransportEvent::Message(msg.data));
        })
    }));
}

async fn add_receive_transceivers(pc: &RTCPeerConnection, media: MediaOptions) -> Result<()> {
    let kinds = [(media.audio, RTPCodecType::Audio), (media.video, RTPCodecType::Video)];
    for (_, kind) in kinds.into_iter().filter(|(enabled, _)| *enabled) {
        pc.add_transceiver_from_kind(
            kind,
            Some(RTCRtpTransceiverInit {
                direction: RTCRtpTransceiverDirection::Recvonly,
                send_encodings: vec![],
            }),
        )
        .await
        .with_context(|| format!("Failed to add {kind} transceiver"))?;
    }
    Ok(())
}

fn map_connection_state(state: RTCPeerConnectionState) -> Option<TransportState> {
    match state {
        RTCPeerConnectionState::New => Some(TransportState::New),
        RTCPeerConnectionState::Connecting => Some(TransportState::Connecting),
        RTCPeerConnectionState::Connected => Some(TransportState::Connected),
        RTCPeerConnectionState::Disconnected => Some(TransportState::Disconnected),
        RTCPeerConnectionState::Failed => Some(TransportState::Failed),
        RTCPeerConnectionState::Closed => Some(TransportState::Closed),
        _ => None,
    }
}

fn to_rtc_ice_server(server: &IceServerConfig) -> RTCIceServer {
    RTCIceServer {
        urls: server.urls.clone(),
        username: server.username.clone().unwrap_or_default(),
        credential: server.credential.clone().unwrap_or_default(),
    }
}

fn to_rtc_description(description: SessionDescription) -> Result<RTCSessionDescription> {
    let desc = match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(description.sdp),
        SdpKind::Answer => RTCSessionDescription::answer(description.sdp),
    };
    desc.context("Invalid session description")
}

fn to_rtc_candidate(candidate: IceCandidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.candidate,
        sdp_mid: candidate.sdp_mid,
        sdp_mline_index: candidate.sdp_m_line_index,
        username_fragment: candidate.username_fragment,
    }
}

fn from_rtc_candidate(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}
