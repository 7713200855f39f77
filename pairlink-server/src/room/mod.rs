mod peer;
mod room;
mod room_registry;

pub use peer::*;
pub use room::*;
pub use room_registry::*;
