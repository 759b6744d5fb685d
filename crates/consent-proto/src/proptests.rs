#[cfg(test)]
mod tests {
    use consent_crypto::Key32;
    use proptest::prelude::*;

    use crate::codec::*;
    use crate::message::Message;
    use crate::payloads::*;
    use crate::topics::Topic;

    fn any_key() -> impl Strategy<Value = Key32> {
        any::<[u8; 32]>().prop_map(Key32::new)
    }

    prop_compose! {
        fn any_transaction_request()(
            transaction_id in any_key(),
            query in "[a-zA-Z{} ]{1,64}",
            title in ".{0,32}",
            description in ".{0,64}",
            signature in "[0-9a-f]{2,256}"
        ) -> TransactionRequest {
            TransactionRequest {
                transaction_id,
                query,
                title,
                description,
                law_applying: "GDPR".into(),
                kind: "consent".into(),
                signature,
            }
        }
    }

    proptest! {
        #[test]
        fn prop_transaction_request_survives_codec(req in any_transaction_request()) {
            let decoded: TransactionRequest = decode_payload(&encode_payload(&req)).unwrap();
            prop_assert_eq!(decoded, req);
        }

        #[test]
        fn prop_message_survives_codec(
            source in any_key(),
            destination in any_key(),
            topic in prop::sample::select(Topic::ALL.to_vec()),
            payload in prop::collection::vec(any::<u8>(), 0..512)
        ) {
            let msg = Message::new(source, destination, topic, payload);
            let decoded = decode_message(&encode_message(&msg)).unwrap();
            prop_assert_eq!(decoded.topic(), Some(topic));
            prop_assert_eq!(decoded, msg);
        }

        #[test]
        fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let _ = decode_message(&bytes);
            let _ = decode_payload::<PreTransactionRequest>(&bytes);
            let _ = decode_payload::<TransactionRequest>(&bytes);
            let _ = decode_payload::<TransactionReply>(&bytes);
        }
    }
}
