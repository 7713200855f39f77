mod signaling_output;
mod ws_link;

pub use signaling_output::*;
pub use ws_link::*;
