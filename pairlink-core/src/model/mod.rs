mod negotiation;
mod peer;
mod room;
mod signaling;

pub use negotiation::{IceCandidate, SdpKind, SessionDescription};
pub use peer::{ConnectionId, PeerId};
pub use room::{DEFAULT_ROOM_CAPACITY, RoomId};
pub use signaling::{ClientSignal, IceServerConfig, ServerSignal, SignalKind, SignalingEnvelope};
