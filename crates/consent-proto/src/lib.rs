//! Wire format for the consent protocol.
//!
//! [`message::Message`] is the framed unit exchanged between parties. Its
//! topic selects one of four payloads defined in [`payloads`], each of which
//! is protobuf-encoded through [`codec`].

#![forbid(unsafe_code)]

pub mod codec;
pub mod message;
pub mod payloads;
pub mod topics;
pub mod v1;
pub mod validation;

#[cfg(test)]
mod proptests;

pub use codec::{decode_message, decode_payload, encode_message, encode_payload, CodecError, Payload};
pub use message::{Body, Header, Message};
pub use payloads::{PreTransactionReply, PreTransactionRequest, TransactionReply, TransactionRequest};
pub use topics::Topic;
pub use validation::{Validate, ValidationError};
