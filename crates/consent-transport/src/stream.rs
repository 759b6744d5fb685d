//! [`Connection`] over any byte stream, e.g. a TCP socket.

use async_trait::async_trait;
use bytes::BytesMut;
use consent_proto::{decode_message, encode_message, Message};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

use crate::framing::LengthCodec;
use crate::traits::{Connection, TransportError};

const READ_CHUNK: usize = 4096;

pub struct StreamConnection<S> {
    stream: S,
    codec: LengthCodec,
    read_buf: BytesMut,
    peer: String,
    closed: bool,
}

impl<S> StreamConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, peer: impl Into<String>) -> Self {
        Self {
            stream,
            codec: LengthCodec::default(),
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            peer: peer.into(),
            closed: false,
        }
    }

    pub fn with_codec(mut self, codec: LengthCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl StreamConnection<TcpStream> {
    /// Wrap an accepted or connected TCP socket.
    pub fn tcp(stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "tcp".to_string());
        let _ = stream.set_nodelay(true);
        Self::new(stream, peer)
    }

    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::tcp(stream))
    }
}

#[async_trait]
impl<S> Connection for StreamConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self) -> Result<Message, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        loop {
            if let Some(frame) = self.codec.decode_stream(&mut self.read_buf)? {
                return Ok(decode_message(&frame)?);
            }
            self.read_buf.reserve(READ_CHUNK);
            let n = self.stream.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                if !self.read_buf.is_empty() {
                    debug!(peer = %self.peer, buffered = self.read_buf.len(), "stream ended mid-frame");
                }
                return Err(TransportError::Closed);
            }
        }
    }

    async fn write(&mut self, message: &Message) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let frame = self.codec.encode(&encode_message(message))?;
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.stream.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn peer(&self) -> String {
        self.peer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consent_crypto::Key32;
    use consent_proto::Topic;
    use tokio_test::io::Builder;

    fn message() -> Message {
        Message::new(
            Key32::new([1u8; 32]),
            Key32::new([2u8; 32]),
            Topic::PreTransactionRequest,
            b"payload".to_vec(),
        )
    }

    fn framed(message: &Message) -> Vec<u8> {
        LengthCodec::default().encode(&encode_message(message)).unwrap()
    }

    #[tokio::test]
    async fn test_read_reassembles_split_frame() {
        let msg = message();
        let bytes = framed(&msg);
        let (a, b) = bytes.split_at(3);
        let mock = Builder::new().read(a).read(b).build();

        let mut conn = StreamConnection::new(mock, "mock");
        assert_eq!(conn.read().await.unwrap(), msg);
        assert!(matches!(conn.read().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_write_emits_one_frame() {
        let msg = message();
        let mock = Builder::new().write(&framed(&msg)).build();

        let mut conn = StreamConnection::new(mock, "mock");
        conn.write(&msg).await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mock = Builder::new().build();
        let mut conn = StreamConnection::new(mock, "mock");
        conn.close().await.unwrap();
        conn.close().await.unwrap();
        assert!(matches!(conn.read().await, Err(TransportError::Closed)));
        assert!(matches!(conn.write(&message()).await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_garbage_frame_is_codec_error() {
        let frame = LengthCodec::default().encode(&[0xFF, 0xFF]).unwrap();
        let mock = Builder::new().read(&frame).build();
        let mut conn = StreamConnection::new(mock, "mock");
        assert!(matches!(conn.read().await, Err(TransportError::Codec(_))));
    }

    #[tokio::test]
    async fn test_custom_codec_limits_frames() {
        let mock = Builder::new().read(&framed(&message())).build();
        let mut conn = StreamConnection::new(mock, "mock").with_codec(LengthCodec::new(8));
        assert!(matches!(conn.read().await, Err(TransportError::Framing(_))));
        let _mock = conn.into_inner();
    }

    #[tokio::test]
    async fn test_tcp_round_trip() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut conn = StreamConnection::tcp(socket);
            let msg = conn.read().await.unwrap();
            conn.write(&msg).await.unwrap();
            conn.close().await.unwrap();
        });

        let mut client = StreamConnection::connect(addr).await.unwrap();
        let msg = message();
        client.write(&msg).await.unwrap();
        assert_eq!(client.read().await.unwrap(), msg);
        assert!(matches!(client.read().await, Err(TransportError::Closed)));
        server.await.unwrap();
    }
}
