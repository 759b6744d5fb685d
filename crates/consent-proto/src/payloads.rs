//! Domain payloads carried in `Body.payload`.

use consent_crypto::Key32;

use crate::codec::{CodecError, Payload};
use crate::topics::Topic;
use crate::v1::*;
use crate::validation::key_field;

/// Opens a transaction: the requester announces its identity and keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreTransactionRequest {
    pub transaction_id: Key32,
    pub signature_public_key: Key32,
    pub main_public_key: Key32,
    pub requester: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreTransactionReply {
    pub success: bool,
}

/// The query phase of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionRequest {
    pub transaction_id: Key32,
    pub query: String,
    pub title: String,
    pub description: String,
    pub law_applying: String,
    pub kind: String,
    /// Hex of the requester's signed query (signature || query).
    pub signature: String,
}

/// Either the released content or an error string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionReply {
    Content(String),
    Error(String),
}

impl TransactionReply {
    pub fn error(message: impl Into<String>) -> Self {
        TransactionReply::Error(message.into())
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            TransactionReply::Content(c) => Some(c),
            TransactionReply::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            TransactionReply::Content(_) => None,
            TransactionReply::Error(e) => Some(e),
        }
    }
}

impl Payload for PreTransactionRequest {
    const TOPIC: Topic = Topic::PreTransactionRequest;
    type Wire = PreTransactionRequestV1;

    fn to_wire(&self) -> Self::Wire {
        PreTransactionRequestV1 {
            transaction_id: self.transaction_id.to_vec(),
            signature_public_key: self.signature_public_key.to_vec(),
            main_public_key: self.main_public_key.to_vec(),
            requester: self.requester.clone(),
        }
    }

    fn from_wire(wire: Self::Wire) -> Result<Self, CodecError> {
        Ok(Self {
            transaction_id: key_field("transaction_id", &wire.transaction_id)?,
            signature_public_key: key_field("signature_public_key", &wire.signature_public_key)?,
            main_public_key: key_field("main_public_key", &wire.main_public_key)?,
            requester: wire.requester,
        })
    }
}

impl Payload for PreTransactionReply {
    const TOPIC: Topic = Topic::PreTransactionReply;
    type Wire = PreTransactionReplyV1;

    fn to_wire(&self) -> Self::Wire {
        PreTransactionReplyV1 { success: self.success }
    }

    fn from_wire(wire: Self::Wire) -> Result<Self, CodecError> {
        Ok(Self { success: wire.success })
    }
}

impl Payload for TransactionRequest {
    const TOPIC: Topic = Topic::TransactionRequest;
    type Wire = TransactionRequestV1;

    fn to_wire(&self) -> Self::Wire {
        TransactionRequestV1 {
            transaction_id: self.transaction_id.to_vec(),
            query: self.query.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            law_applying: self.law_applying.clone(),
            kind: self.kind.clone(),
            signature: self.signature.clone(),
        }
    }

    fn from_wire(wire: Self::Wire) -> Result<Self, CodecError> {
        Ok(Self {
            transaction_id: key_field("transaction_id", &wire.transaction_id)?,
            query: wire.query,
            title: wire.title,
            description: wire.description,
            law_applying: wire.law_applying,
            kind: wire.kind,
            signature: wire.signature,
        })
    }
}

impl Payload for TransactionReply {
    const TOPIC: Topic = Topic::TransactionReply;
    type Wire = TransactionReplyV1;

    fn to_wire(&self) -> Self::Wire {
        match self {
            TransactionReply::Content(c) => TransactionReplyV1 {
                content: Some(c.clone()),
                error: None,
            },
            TransactionReply::Error(e) => TransactionReplyV1 {
                content: None,
                error: Some(e.clone()),
            },
        }
    }

    fn from_wire(wire: Self::Wire) -> Result<Self, CodecError> {
        // validate() has already rejected both-or-neither
        match (wire.content, wire.error) {
            (_, Some(e)) => Ok(TransactionReply::Error(e)),
            (Some(c), None) => Ok(TransactionReply::Content(c)),
            (None, None) => Err(CodecError::MissingField("content")),
        }
    }
}
