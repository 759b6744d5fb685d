#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::asymmetric::CryptoBox;
    use crate::keys::Key32;
    use crate::secretbox::SecretBox;
    use crate::sign::Signer;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_box_round_trip(message in prop::collection::vec(any::<u8>(), 0..2048)) {
            let alice = CryptoBox::generate();
            let bob = CryptoBox::generate();
            let sealed = alice.encrypt(&message, bob.public_key()).unwrap();
            prop_assert_eq!(bob.decrypt(&sealed, alice.public_key()).unwrap(), message);
        }

        #[test]
        fn prop_box_other_key_rejects(message in prop::collection::vec(any::<u8>(), 0..512)) {
            let alice = CryptoBox::generate();
            let bob = CryptoBox::generate();
            let eve = CryptoBox::generate();
            let sealed = alice.encrypt(&message, bob.public_key()).unwrap();
            prop_assert!(eve.decrypt(&sealed, alice.public_key()).is_err());
        }

        #[test]
        fn prop_secretbox_round_trip(
            key in any::<[u8; 32]>(),
            message in prop::collection::vec(any::<u8>(), 0..2048)
        ) {
            let sb = SecretBox::new(Key32::new(key));
            let sealed = sb.encrypt(&message).unwrap();
            prop_assert_eq!(sb.decrypt(&sealed).unwrap(), message);
        }

        #[test]
        fn prop_sign_round_trip(message in prop::collection::vec(any::<u8>(), 1..1024)) {
            let signer = Signer::generate();
            let signed = signer.sign(&message).unwrap();
            prop_assert_eq!(signer.verify(&signed).unwrap(), message);
        }

        #[test]
        fn prop_sign_tamper_detected(
            message in prop::collection::vec(any::<u8>(), 1..256),
            index in 0usize..64
        ) {
            let signer = Signer::generate();
            let mut signed = signer.sign(&message).unwrap();
            signed[index] ^= 0x80;
            prop_assert!(signer.verify(&signed).is_err());
        }

        #[test]
        fn prop_key32_hex_round_trip(bytes in any::<[u8; 32]>()) {
            let key = Key32::new(bytes);
            prop_assert_eq!(Key32::from_hex(&key.to_hex()).unwrap(), key);
        }
    }
}
