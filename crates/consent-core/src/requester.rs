//! Requester side of the handshake.
//!
//! Drives one transaction at a time over a [`Connection`] to a responder:
//! announce the transaction, then send the signed query and wait for the
//! content or an error string.

use tracing::{debug, info};

use consent_crypto::{Key32, Keychain};
use consent_proto::{
    Message, PreTransactionReply, PreTransactionRequest, Topic, TransactionReply, TransactionRequest,
};
use consent_transport::Connection;

use crate::errors::EngineError;
use crate::types::short_id;

/// What the requester asks for in the transaction phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionDetails {
    pub query: String,
    pub title: String,
    pub description: String,
    pub law_applying: String,
    pub kind: String,
}

impl TransactionDetails {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn titled(mut self, title: impl Into<String>, description: impl Into<String>) -> Self {
        self.title = title.into();
        self.description = description.into();
        self
    }

    pub fn under_law(mut self, law_applying: impl Into<String>) -> Self {
        self.law_applying = law_applying.into();
        self
    }
}

pub struct Requester<C> {
    conn: C,
    keychain: Keychain,
    name: String,
    responder: Key32,
}

impl<C: Connection> Requester<C> {
    pub fn new(conn: C, keychain: Keychain, name: impl Into<String>, responder: Key32) -> Self {
        Self {
            conn,
            keychain,
            name: name.into(),
            responder,
        }
    }

    pub fn keychain(&self) -> &Keychain {
        &self.keychain
    }

    /// Run both phases under a fresh transaction ID.
    pub async fn request(&mut self, details: &TransactionDetails) -> Result<String, EngineError> {
        let transaction_id = Key32::random();
        self.pre_transact(transaction_id).await?;
        self.transact(transaction_id, details).await
    }

    /// Announce `transaction_id` to the responder.
    pub async fn pre_transact(&mut self, transaction_id: Key32) -> Result<(), EngineError> {
        let request = PreTransactionRequest {
            transaction_id,
            signature_public_key: self.keychain.signature_public_key(),
            main_public_key: self.keychain.main_public_key(),
            requester: self.name.clone(),
        };
        let reply: PreTransactionReply = self.exchange(&request, Topic::PreTransactionReply).await?;
        debug!(transaction = %short_id(&transaction_id), success = reply.success, "pre-transaction reply");

        if reply.success {
            Ok(())
        } else {
            Err(EngineError::PreTransactionRejected)
        }
    }

    /// Send the signed query for an announced transaction.
    pub async fn transact(
        &mut self,
        transaction_id: Key32,
        details: &TransactionDetails,
    ) -> Result<String, EngineError> {
        let signed = self.keychain.signer().sign(details.query.as_bytes())?;
        let request = TransactionRequest {
            transaction_id,
            query: details.query.clone(),
            title: details.title.clone(),
            description: details.description.clone(),
            law_applying: details.law_applying.clone(),
            kind: details.kind.clone(),
            signature: hex::encode(signed),
        };
        let reply: TransactionReply = self.exchange(&request, Topic::TransactionReply).await?;

        match reply {
            TransactionReply::Content(content) => {
                info!(transaction = %short_id(&transaction_id), "transaction answered");
                Ok(content)
            }
            TransactionReply::Error(reason) => Err(EngineError::TransactionRejected(reason)),
        }
    }

    pub async fn close(mut self) -> Result<(), EngineError> {
        self.conn.close().await?;
        Ok(())
    }

    async fn exchange<Req, Rep>(&mut self, request: &Req, expected: Topic) -> Result<Rep, EngineError>
    where
        Req: consent_proto::Payload + Sync,
        Rep: consent_proto::Payload,
    {
        let message = Message::with_payload(self.keychain.main_public_key(), self.responder, request);
        self.conn.write(&message).await?;

        let reply = self.conn.read().await?;
        if reply.topic() != Some(expected) {
            return Err(EngineError::UnexpectedReply(format!(
                "expected {}, got topic {}",
                expected,
                reply.header.topic.to_hex()
            )));
        }
        reply
            .decode_payload()
            .map_err(|e| EngineError::UnexpectedReply(e.to_string()))
    }
}
