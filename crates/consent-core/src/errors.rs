//! Error types for the consent core.
//!
//! Library errors are `thiserror` enums. What reaches the wire is a
//! [`RejectReason`]: a fixed set of strings that never carries the
//! underlying cause.

use std::fmt;

use thiserror::Error;

use consent_transport::TransportError;

/// Errors from the pending-transaction queue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("transaction already exists: {0}")]
    AlreadyExists(String),

    #[error("transaction not found: {0}")]
    NotFound(String),

    #[error("transaction already consumed: {0}")]
    AlreadyConsumed(String),
}

/// Errors from parsing a field-selection query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("query is empty")]
    Empty,

    #[error("unexpected end of query")]
    UnexpectedEof,

    #[error("unexpected '{found}' at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("unterminated string at offset {0}")]
    UnterminatedString(usize),

    #[error("unsupported construct: {0}")]
    Unsupported(String),

    #[error("selections nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Errors from an authorization plugin.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("authorization timed out")]
    Timeout,

    #[error("notification channel error: {0}")]
    Channel(String),

    #[error("reply for a different transaction: {0}")]
    MismatchedReply(String),

    #[error("authorization failed: {0}")]
    Failed(String),
}

/// Errors from the downstream data service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataServiceError {
    #[error("http error: {0}")]
    Http(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("encoding content failed: {0}")]
    Encoding(String),
}

/// Errors from the public-key store.
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("no key stored")]
    NotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed key file: {0}")]
    Malformed(String),
}

/// Errors surfaced by the engine handle and the requester client.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine intake queue is full")]
    Busy,

    #[error("engine has stopped")]
    Stopped,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("crypto error: {0}")]
    Crypto(#[from] consent_crypto::CryptoError),

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("pre-transaction rejected")]
    PreTransactionRejected,

    #[error("transaction rejected: {0}")]
    TransactionRejected(String),
}

/// Error strings written into a transaction reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    DecodeFailed,
    UnknownTransaction,
    SignatureInvalid,
    QueryParseFailed,
    NotAuthorized,
    CommitmentFailed,
}

impl RejectReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            RejectReason::DecodeFailed => "decoding payload failed",
            RejectReason::UnknownTransaction => "transaction does not exist in queue",
            RejectReason::SignatureInvalid => "signature verification failed",
            RejectReason::QueryParseFailed => "query parsing failed",
            RejectReason::NotAuthorized => "not authorized",
            RejectReason::CommitmentFailed => "transaction commitment failed",
        }
    }

    pub fn from_wire(message: &str) -> Option<Self> {
        [
            RejectReason::DecodeFailed,
            RejectReason::UnknownTransaction,
            RejectReason::SignatureInvalid,
            RejectReason::QueryParseFailed,
            RejectReason::NotAuthorized,
            RejectReason::CommitmentFailed,
        ]
        .into_iter()
        .find(|r| r.as_str() == message)
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
