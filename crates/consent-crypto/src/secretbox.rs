//! Symmetric authenticated encryption with one shared 32-byte key.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::aead;
use crate::keys::Key32;
use crate::CryptoError;

#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretBox {
    key: [u8; 32],
}

impl SecretBox {
    pub fn new(key: Key32) -> Self {
        Self { key: *key.as_bytes() }
    }

    /// Returns nonce(24) || ciphertext+tag.
    pub fn encrypt(&self, message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        aead::seal(&self.key, message)
    }

    pub fn decrypt(&self, encrypted: &[u8]) -> Result<Vec<u8>, CryptoError> {
        aead::open(&self.key, encrypted)
    }
}

impl fmt::Debug for SecretBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBox(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secretbox_round_trip() {
        let sb = SecretBox::new(Key32::random());
        for size in [0usize, 1, 2, 64, 4096] {
            let msg = vec![9u8; size];
            let sealed = sb.encrypt(&msg).unwrap();
            assert_eq!(sb.decrypt(&sealed).unwrap(), msg);
        }
    }

    #[test]
    fn test_secretbox_wrong_key_fails() {
        let a = SecretBox::new(Key32::random());
        let b = SecretBox::new(Key32::random());
        let sealed = a.encrypt(b"secret").unwrap();
        assert_eq!(b.decrypt(&sealed), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn test_secretbox_tampered_nonce_fails() {
        let sb = SecretBox::new(Key32::random());
        let mut sealed = sb.encrypt(b"secret").unwrap();
        sealed[0] ^= 0xFF;
        assert_eq!(sb.decrypt(&sealed), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn test_secretbox_truncated_fails() {
        let sb = SecretBox::new(Key32::random());
        let sealed = sb.encrypt(b"secret").unwrap();
        assert!(sb.decrypt(&sealed[..20]).is_err());
    }
}
