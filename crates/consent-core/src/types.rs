//! Shared domain types.

use consent_crypto::Key32;
use consent_proto::PreTransactionRequest;

/// A transaction accepted in the pre-transaction phase, awaiting its query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub transaction_id: Key32,
    pub requester_name: String,
    /// The requester's main public key (its address).
    pub requester_public_key: Key32,
    /// Key the transaction request's query signature is checked against.
    pub signature_public_key: Key32,
}

impl From<&PreTransactionRequest> for Entry {
    fn from(req: &PreTransactionRequest) -> Self {
        Self {
            transaction_id: req.transaction_id,
            requester_name: req.requester.clone(),
            requester_public_key: req.main_public_key,
            signature_public_key: req.signature_public_key,
        }
    }
}

/// One top-level selection of a query and the fields requested from it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectionData {
    pub structure: String,
    pub fields: Vec<String>,
}

/// Short hex prefix of a key, for log lines.
pub(crate) fn short_id(key: &Key32) -> String {
    key.to_hex()[..16].to_string()
}
