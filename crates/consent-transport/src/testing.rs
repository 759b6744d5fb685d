//! In-process connections for tests and demos.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use consent_proto::{decode_message, encode_message, Message};
use tokio::sync::mpsc;

use crate::framing::LengthCodec;
use crate::traits::{Connection, TransportError};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// One end of an in-memory duplex pair.
///
/// Messages pass through the same encode/decode path as a real stream so
/// framing limits and key-size checks apply.
pub struct MemoryConnection {
    label: String,
    codec: LengthCodec,
    tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MemoryConnection {
    /// Create a connected pair. Closing or dropping one end makes the other
    /// end's `read` return [`TransportError::Closed`].
    pub fn pair() -> (Self, Self) {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let (tx_a, rx_b) = mpsc::unbounded_channel();
        let (tx_b, rx_a) = mpsc::unbounded_channel();
        (
            Self {
                label: format!("memory-{}a", id),
                codec: LengthCodec::default(),
                tx: Some(tx_a),
                rx: rx_a,
            },
            Self {
                label: format!("memory-{}b", id),
                codec: LengthCodec::default(),
                tx: Some(tx_b),
                rx: rx_b,
            },
        )
    }

    /// Push raw bytes to the peer, bypassing message encoding.
    pub fn write_raw(&mut self, frame_body: Vec<u8>) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(frame_body).map_err(|_| TransportError::Closed)
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn read(&mut self) -> Result<Message, TransportError> {
        let frame = self.rx.recv().await.ok_or(TransportError::Closed)?;
        Ok(decode_message(&frame)?)
    }

    async fn write(&mut self, message: &Message) -> Result<(), TransportError> {
        let body = encode_message(message);
        self.codec.check_len(body.len())?;
        self.write_raw(body)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        self.rx.close();
        Ok(())
    }

    fn peer(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consent_crypto::Key32;
    use consent_proto::Topic;

    fn message(payload: Vec<u8>) -> Message {
        Message::new(Key32::random(), Key32::random(), Topic::TransactionRequest, payload)
    }

    #[tokio::test]
    async fn test_pair_delivers_in_order() {
        let (mut a, mut b) = MemoryConnection::pair();
        let first = message(vec![1]);
        let second = message(vec![2]);
        a.write(&first).await.unwrap();
        a.write(&second).await.unwrap();
        assert_eq!(b.read().await.unwrap(), first);
        assert_eq!(b.read().await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_close_ends_peer_read() {
        let (mut a, mut b) = MemoryConnection::pair();
        a.close().await.unwrap();
        a.close().await.unwrap();
        assert!(matches!(b.read().await, Err(TransportError::Closed)));
        assert!(matches!(a.write(&message(vec![])).await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_drop_ends_peer_read() {
        let (a, mut b) = MemoryConnection::pair();
        drop(a);
        assert!(matches!(b.read().await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_oversized_write_rejected() {
        let (mut a, _b) = MemoryConnection::pair();
        let result = a.write(&message(vec![0u8; 70 * 1024])).await;
        assert!(matches!(result, Err(TransportError::Framing(_))));
    }

    #[tokio::test]
    async fn test_raw_garbage_is_codec_error() {
        let (mut a, mut b) = MemoryConnection::pair();
        a.write_raw(vec![0xFF, 0x01]).unwrap();
        assert!(matches!(b.read().await, Err(TransportError::Codec(_))));
    }

    #[test]
    fn test_labels_are_unique() {
        let (a, b) = MemoryConnection::pair();
        let (c, _) = MemoryConnection::pair();
        assert_ne!(a.peer(), b.peer());
        assert_ne!(a.peer(), c.peer());
    }
}
