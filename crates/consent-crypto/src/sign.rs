//! Ed25519 signing with attached messages.
//!
//! [`Signer::sign`] returns `signature(64) || message`; [`Verifier::verify`]
//! checks the signature and hands back the message.

use std::fmt;

use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey};
use rand_core::OsRng;

use crate::keys::{Key32, Key64, KeyError};
use crate::CryptoError;

/// Size of an Ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Holds a signing private key and its public key.
#[derive(Clone)]
pub struct Signer {
    // SigningKey zeroizes itself on drop
    signing_key: SigningKey,
}

impl Signer {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild from 64 keypair bytes (seed || public key).
    pub fn from_keypair(private_key: &Key64) -> Result<Self, KeyError> {
        let signing_key = SigningKey::from_keypair_bytes(private_key.as_bytes())
            .map_err(|e| KeyError::InvalidEncoding(e.to_string()))?;
        Ok(Self { signing_key })
    }

    pub fn public_key(&self) -> Key32 {
        Key32::new(self.signing_key.verifying_key().to_bytes())
    }

    pub fn private_key(&self) -> Key64 {
        Key64::new(self.signing_key.to_keypair_bytes())
    }

    /// Sign `message`, returning signature || message.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if message.is_empty() {
            return Err(CryptoError::EmptyMessage);
        }
        let signature: Signature = self.signing_key.sign(message);
        let mut out = Vec::with_capacity(SIGNATURE_SIZE + message.len());
        out.extend_from_slice(&signature.to_bytes());
        out.extend_from_slice(message);
        Ok(out)
    }

    pub fn verify(&self, signed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.verifier().verify(signed)
    }

    pub fn verifier(&self) -> Verifier {
        Verifier {
            verifying_key: self.signing_key.verifying_key(),
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("public", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Verify-only half of a [`Signer`], built from a peer's public key.
#[derive(Clone, Debug)]
pub struct Verifier {
    verifying_key: VerifyingKey,
}

impl Verifier {
    pub fn from_public_key(public_key: &Key32) -> Result<Self, KeyError> {
        let verifying_key = VerifyingKey::from_bytes(public_key.as_bytes())
            .map_err(|e| KeyError::InvalidEncoding(e.to_string()))?;
        Ok(Self { verifying_key })
    }

    pub fn public_key(&self) -> Key32 {
        Key32::new(self.verifying_key.to_bytes())
    }

    /// Check `signature || message` and return the message.
    pub fn verify(&self, signed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if signed.len() < SIGNATURE_SIZE {
            return Err(CryptoError::VerificationFailed);
        }
        let (sig_bytes, message) = signed.split_at(SIGNATURE_SIZE);
        let sig_bytes: [u8; SIGNATURE_SIZE] = sig_bytes
            .try_into()
            .map_err(|_| CryptoError::VerificationFailed)?;
        let signature = Signature::from_bytes(&sig_bytes);
        self.verifying_key
            .verify_strict(message, &signature)
            .map_err(|_| CryptoError::VerificationFailed)?;
        Ok(message.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_round_trip() {
        let signer = Signer::generate();
        let signed = signer.sign(b"query { personalDetails { name } }").unwrap();
        assert_eq!(
            signer.verify(&signed).unwrap(),
            b"query { personalDetails { name } }"
        );
    }

    #[test]
    fn test_sign_empty_fails() {
        let signer = Signer::generate();
        assert_eq!(signer.sign(b""), Err(CryptoError::EmptyMessage));
    }

    #[test]
    fn test_tampered_signature_fails() {
        let signer = Signer::generate();
        let mut signed = signer.sign(b"message").unwrap();
        signed[0] ^= 0xFF;
        assert_eq!(signer.verify(&signed), Err(CryptoError::VerificationFailed));
    }

    #[test]
    fn test_tampered_message_fails() {
        let signer = Signer::generate();
        let mut signed = signer.sign(b"message").unwrap();
        let last = signed.len() - 1;
        signed[last] ^= 0x01;
        assert!(signer.verify(&signed).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let a = Signer::generate();
        let b = Signer::generate();
        let signed = a.sign(b"message").unwrap();
        assert!(b.verify(&signed).is_err());
    }

    #[test]
    fn test_verify_short_input_fails() {
        let signer = Signer::generate();
        assert_eq!(
            signer.verify(&[0u8; 12]),
            Err(CryptoError::VerificationFailed)
        );
    }

    #[test]
    fn test_verifier_from_public_key() {
        let signer = Signer::generate();
        let verifier = Verifier::from_public_key(&signer.public_key()).unwrap();
        let signed = signer.sign(b"hello").unwrap();
        assert_eq!(verifier.verify(&signed).unwrap(), b"hello");
    }

    #[test]
    fn test_keypair_round_trip() {
        let signer = Signer::generate();
        let restored = Signer::from_keypair(&signer.private_key()).unwrap();
        assert_eq!(restored.public_key(), signer.public_key());
        let signed = restored.sign(b"x").unwrap();
        assert!(signer.verify(&signed).is_ok());
    }
}
