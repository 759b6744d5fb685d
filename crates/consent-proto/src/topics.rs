//! Topic registry.
//!
//! A topic is a [`Key32`] whose first byte is an ASCII digit and whose
//! remaining bytes are zero.

use std::fmt;

use consent_crypto::Key32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    PreTransactionRequest,
    PreTransactionReply,
    TransactionRequest,
    TransactionReply,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::PreTransactionRequest,
        Topic::PreTransactionReply,
        Topic::TransactionRequest,
        Topic::TransactionReply,
    ];

    const fn tag(self) -> u8 {
        match self {
            Topic::PreTransactionRequest => b'1',
            Topic::PreTransactionReply => b'2',
            Topic::TransactionRequest => b'3',
            Topic::TransactionReply => b'4',
        }
    }

    /// The sentinel key carried in `Header.topic`.
    pub const fn key(self) -> Key32 {
        let mut bytes = [0u8; 32];
        bytes[0] = self.tag();
        Key32::new(bytes)
    }

    pub fn from_key(key: &Key32) -> Option<Topic> {
        Topic::ALL.into_iter().find(|t| t.key() == *key)
    }

    pub fn is_request(self) -> bool {
        matches!(self, Topic::PreTransactionRequest | Topic::TransactionRequest)
    }

    /// Topic used to answer a request; `None` for reply topics.
    pub fn reply_topic(self) -> Option<Topic> {
        match self {
            Topic::PreTransactionRequest => Some(Topic::PreTransactionReply),
            Topic::TransactionRequest => Some(Topic::TransactionReply),
            Topic::PreTransactionReply | Topic::TransactionReply => None,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Topic::PreTransactionRequest => "pre-transaction-request",
            Topic::PreTransactionReply => "pre-transaction-reply",
            Topic::TransactionRequest => "transaction-request",
            Topic::TransactionReply => "transaction-reply",
        };
        write!(f, "{}({})", name, self.tag() as char)
    }
}
