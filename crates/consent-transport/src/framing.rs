//! Length-prefixed framing for reliable message delimiting.

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

/// Maximum size of one encoded message (64KB)
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Size of the big-endian length prefix
pub const LENGTH_PREFIX_SIZE: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("Frame too large: {0} bytes (max: {1})")]
    TooLarge(usize, usize),

    #[error("Incomplete frame: need {0} more bytes")]
    Incomplete(usize),
}

/// Length-prefixed frame codec
#[derive(Debug, Clone, Copy)]
pub struct LengthCodec {
    max_frame_size: usize,
}

impl LengthCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Reject a frame body longer than the limit
    pub fn check_len(&self, len: usize) -> Result<(), FramingError> {
        if len > self.max_frame_size {
            return Err(FramingError::TooLarge(len, self.max_frame_size));
        }
        Ok(())
    }

    /// Encode data with length prefix
    /// Format: length (4 bytes BE) || data
    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>, FramingError> {
        self.check_len(data.len())?;

        let mut encoded = Vec::with_capacity(LENGTH_PREFIX_SIZE + data.len());
        encoded.put_u32(data.len() as u32);
        encoded.extend_from_slice(data);
        Ok(encoded)
    }

    /// Decode one complete frame held in `framed`
    pub fn decode(&self, framed: &[u8]) -> Result<Vec<u8>, FramingError> {
        if framed.len() < LENGTH_PREFIX_SIZE {
            return Err(FramingError::Incomplete(LENGTH_PREFIX_SIZE - framed.len()));
        }

        let mut buf = framed;
        let len = buf.get_u32() as usize;
        self.check_len(len)?;

        if buf.remaining() < len {
            return Err(FramingError::Incomplete(len - buf.remaining()));
        }

        Ok(buf[..len].to_vec())
    }

    /// Streaming decoder for partial reads
    /// Returns Some(data) when a complete frame is available, None if more data needed
    pub fn decode_stream(&self, buf: &mut BytesMut) -> Result<Option<Vec<u8>>, FramingError> {
        if buf.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        let len = {
            let mut len_buf = &buf[..LENGTH_PREFIX_SIZE];
            len_buf.get_u32() as usize
        };
        self.check_len(len)?;

        if buf.len() < LENGTH_PREFIX_SIZE + len {
            buf.reserve(LENGTH_PREFIX_SIZE + len - buf.len());
            return Ok(None);
        }

        buf.advance(LENGTH_PREFIX_SIZE);
        let frame = buf.split_to(len).to_vec();
        Ok(Some(frame))
    }
}

impl Default for LengthCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_SIZE)
    }
}
