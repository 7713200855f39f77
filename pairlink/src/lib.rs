pub use pairlink_core::model::{PeerId, RoomId};

pub mod model {
    pub use pairlink_core::model::*;
}

pub mod utils {
    pub use pairlink_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use pairlink_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use pairlink_client::*;
}
