mod pending;
mod sequencer;
mod session_command;
mod session_event;
mod session_handle;
mod state;

pub use pending::*;
pub use session_event::*;
pub use session_handle::*;
pub use state::*;
