//! Message framing: parties are addressed by their main public key.

use consent_crypto::Key32;

use crate::codec::{decode_payload, encode_payload, CodecError, Payload};
use crate::topics::Topic;
use crate::v1::MessageV1;
use crate::validation::{key_field, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    pub source: Key32,
    pub destination: Key32,
    pub topic: Key32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Body {
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub body: Body,
}

impl Message {
    pub fn new(source: Key32, destination: Key32, topic: Topic, payload: Vec<u8>) -> Self {
        Self {
            header: Header {
                source,
                destination,
                topic: topic.key(),
            },
            body: Body { payload },
        }
    }

    /// Encode `payload` under its own topic.
    pub fn with_payload<P: Payload>(source: Key32, destination: Key32, payload: &P) -> Self {
        Self::new(source, destination, P::TOPIC, encode_payload(payload))
    }

    /// `None` when the header carries an unregistered topic.
    pub fn topic(&self) -> Option<Topic> {
        Topic::from_key(&self.header.topic)
    }

    /// Build the answer to this message: source and destination swapped.
    pub fn reply<P: Payload>(&self, payload: &P) -> Message {
        Self::with_payload(self.header.destination, self.header.source, payload)
    }

    /// Decode the body, checking that the header topic matches `P`.
    pub fn decode_payload<P: Payload>(&self) -> Result<P, CodecError> {
        let actual = self.topic();
        if actual != Some(P::TOPIC) {
            return Err(CodecError::TopicMismatch {
                expected: P::TOPIC,
                actual,
            });
        }
        decode_payload(&self.body.payload)
    }
}

impl From<&Message> for MessageV1 {
    fn from(message: &Message) -> Self {
        Self {
            source: message.header.source.to_vec(),
            destination: message.header.destination.to_vec(),
            topic: message.header.topic.to_vec(),
            payload: message.body.payload.clone(),
        }
    }
}

impl TryFrom<MessageV1> for Message {
    type Error = ValidationError;

    fn try_from(wire: MessageV1) -> Result<Self, Self::Error> {
        Ok(Self {
            header: Header {
                source: key_field("source", &wire.source)?,
                destination: key_field("destination", &wire.destination)?,
                topic: key_field("topic", &wire.topic)?,
            },
            body: Body {
                payload: wire.payload,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::{PreTransactionReply, PreTransactionRequest, TransactionReply};

    #[test]
    fn test_reply_swaps_parties() {
        let requester = Key32::random();
        let responder = Key32::random();
        let request = Message::with_payload(
            requester,
            responder,
            &PreTransactionRequest {
                transaction_id: Key32::random(),
                signature_public_key: Key32::random(),
                main_public_key: requester,
                requester: "ACME".into(),
            },
        );

        let reply = request.reply(&PreTransactionReply { success: true });
        assert_eq!(reply.header.source, responder);
        assert_eq!(reply.header.destination, requester);
        assert_eq!(reply.topic(), Some(Topic::PreTransactionReply));
        assert!(reply.decode_payload::<PreTransactionReply>().unwrap().success);
    }

    #[test]
    fn test_decode_checks_topic() {
        let msg = Message::with_payload(
            Key32::random(),
            Key32::random(),
            &TransactionReply::error("x"),
        );
        assert_eq!(
            msg.decode_payload::<PreTransactionReply>(),
            Err(CodecError::TopicMismatch {
                expected: Topic::PreTransactionReply,
                actual: Some(Topic::TransactionReply),
            })
        );
    }

    #[test]
    fn test_unknown_topic() {
        let mut msg = Message::new(Key32::random(), Key32::random(), Topic::TransactionRequest, vec![]);
        msg.header.topic = Key32::new([9u8; 32]);
        assert_eq!(msg.topic(), None);
    }
}
