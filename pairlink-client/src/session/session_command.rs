use crate::error::SessionError;
use bytes::Bytes;
use tokio::sync::oneshot;

/// Requests from `SessionHandle`s to the sequencer.
#[derive(Debug)]
pub enum SessionCommand {
    Start {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },

    End {
        reply: oneshot::Sender<()>,
    },

    Send {
        data: Bytes,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
}
