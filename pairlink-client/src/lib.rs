mod config;
mod connect;
mod error;
mod session;
mod signaling;
mod transport;

pub use config::*;
pub use connect::*;
pub use error::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
