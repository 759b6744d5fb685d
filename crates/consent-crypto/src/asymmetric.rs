//! Public-key authenticated encryption.
//!
//! A [`CryptoBox`] owns an X25519 key pair. The key used to seal a message
//! for a peer is HKDF-SHA256 over the X25519 shared secret, so both sides of
//! a pair derive the same key and every ciphertext is authenticated by the
//! sender's private key. Each seal draws a fresh random 24-byte nonce and
//! prepends it to the XChaCha20-Poly1305 ciphertext.
//!
//! [`CryptoBox::precompute`] returns that derived key as a [`SharedKey`] so
//! repeated exchanges with one peer skip the Diffie-Hellman step.

use std::fmt;

use hkdf::Hkdf;
use rand_core::OsRng;
use sha2::Sha256;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::aead;
use crate::keys::Key32;
use crate::CryptoError;

pub use crate::aead::NONCE_SIZE;

const BOX_KEY_INFO: &[u8] = b"consent_box_v1_key";

/// Reusable key shared with one peer.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedKey([u8; 32]);

impl SharedKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        aead::seal(&self.0, plaintext)
    }

    pub fn open(&self, blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
        aead::open(&self.0, blob)
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedKey(<redacted>)")
    }
}

/// X25519 key pair with box semantics.
#[derive(Clone)]
pub struct CryptoBox {
    // StaticSecret zeroizes itself on drop
    secret: StaticSecret,
    public: Key32,
}

impl CryptoBox {
    /// One-shot box with a freshly generated key pair.
    pub fn generate() -> Self {
        Self::from_secret(StaticSecret::random_from_rng(OsRng))
    }

    /// Rebuild a box from stored private key bytes.
    pub fn from_private_key(private_key: [u8; 32]) -> Self {
        Self::from_secret(StaticSecret::from(private_key))
    }

    fn from_secret(secret: StaticSecret) -> Self {
        let public = Key32::new(*X25519PublicKey::from(&secret).as_bytes());
        Self { secret, public }
    }

    pub fn public_key(&self) -> &Key32 {
        &self.public
    }

    /// Derive the key shared with `peer_public_key`.
    ///
    /// `a.precompute(b.public_key())` equals `b.precompute(a.public_key())`.
    pub fn precompute(&self, peer_public_key: &Key32) -> Result<SharedKey, CryptoError> {
        let peer = X25519PublicKey::from(*peer_public_key.as_bytes());
        let shared = self.secret.diffie_hellman(&peer);

        let hk = Hkdf::<Sha256>::new(None, shared.as_bytes());
        let mut key = [0u8; 32];
        hk.expand(BOX_KEY_INFO, &mut key)
            .map_err(|_| CryptoError::KeyDerivationFailed)?;
        Ok(SharedKey(key))
    }

    /// Seal `message` for the holder of `recipient_public_key`.
    pub fn encrypt(&self, message: &[u8], recipient_public_key: &Key32) -> Result<Vec<u8>, CryptoError> {
        self.precompute(recipient_public_key)?.seal(message)
    }

    /// Open a message sealed by the holder of `sender_public_key`.
    pub fn decrypt(&self, ciphertext: &[u8], sender_public_key: &Key32) -> Result<Vec<u8>, CryptoError> {
        self.precompute(sender_public_key)?.open(ciphertext)
    }

    pub fn encrypt_after_precomputation(
        &self,
        message: &[u8],
        shared_key: &SharedKey,
    ) -> Result<Vec<u8>, CryptoError> {
        shared_key.seal(message)
    }

    pub fn decrypt_after_precomputation(
        &self,
        ciphertext: &[u8],
        shared_key: &SharedKey,
    ) -> Result<Vec<u8>, CryptoError> {
        shared_key.open(ciphertext)
    }
}

impl fmt::Debug for CryptoBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoBox")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}
