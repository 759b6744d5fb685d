//! The connection contract the handshake engine runs on.

use async_trait::async_trait;
use consent_proto::{CodecError, Message};

use crate::framing::FramingError;

/// A bidirectional channel carrying whole [`Message`]s.
///
/// `read` waits until a full message is available or the channel closes.
/// `write` sends one message as a single frame. `close` may be called after
/// an error and more than once.
#[async_trait]
pub trait Connection: Send {
    async fn read(&mut self) -> Result<Message, TransportError>;

    async fn write(&mut self, message: &Message) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;

    /// Human-readable peer label for logs.
    fn peer(&self) -> String {
        "unknown".to_string()
    }
}

#[async_trait]
impl<C: Connection + ?Sized> Connection for Box<C> {
    async fn read(&mut self) -> Result<Message, TransportError> {
        (**self).read().await
    }

    async fn write(&mut self, message: &Message) -> Result<(), TransportError> {
        (**self).write(message).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        (**self).close().await
    }

    fn peer(&self) -> String {
        (**self).peer()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl TransportError {
    /// True when the peer went away rather than sending bad data.
    pub fn is_disconnect(&self) -> bool {
        match self {
            TransportError::Closed => true,
            TransportError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
