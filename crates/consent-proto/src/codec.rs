//! Payload and message codec.
//!
//! Payloads are protobuf-encoded into `Body.payload`; whole messages are
//! protobuf-encoded into a frame body by the transport. Every decode runs the
//! structural checks in [`crate::validation`].

use prost::Message as _;

use crate::message::Message;
use crate::topics::Topic;
use crate::v1::MessageV1;
use crate::validation::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("protobuf decode failed: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("invalid field: {0}")]
    Invalid(#[from] ValidationError),
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("topic mismatch: expected {expected}, got {actual:?}")]
    TopicMismatch { expected: Topic, actual: Option<Topic> },
}

/// A payload struct tied to the topic it travels under.
pub trait Payload: Sized {
    const TOPIC: Topic;
    type Wire: prost::Message + Default + Validate;

    fn to_wire(&self) -> Self::Wire;
    fn from_wire(wire: Self::Wire) -> Result<Self, CodecError>;
}

pub fn encode_payload<P: Payload>(payload: &P) -> Vec<u8> {
    payload.to_wire().encode_to_vec()
}

pub fn decode_payload<P: Payload>(bytes: &[u8]) -> Result<P, CodecError> {
    let wire = P::Wire::decode(bytes)?;
    wire.validate()?;
    P::from_wire(wire)
}

pub fn encode_message(message: &Message) -> Vec<u8> {
    MessageV1::from(message).encode_to_vec()
}

pub fn decode_message(bytes: &[u8]) -> Result<Message, CodecError> {
    let wire = MessageV1::decode(bytes)?;
    Ok(Message::try_from(wire)?)
}
