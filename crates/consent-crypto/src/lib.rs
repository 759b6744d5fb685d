//! Cryptographic primitives for the consent protocol.
//!
//! - [`keys`]: fixed-size key material used as identities and map keys
//! - [`asymmetric`]: public-key authenticated encryption and precomputed shared keys
//! - [`secretbox`]: symmetric authenticated encryption
//! - [`sign`]: attached signatures (signature || message)
//! - [`keychain`]: the per-party bundle of main, storage and signature keys

#![forbid(unsafe_code)]

mod aead;
pub mod asymmetric;
pub mod keychain;
pub mod keys;
pub mod secretbox;
pub mod sign;
pub mod utils;

#[cfg(test)]
mod proptests;

pub use asymmetric::{CryptoBox, SharedKey};
pub use keychain::Keychain;
pub use keys::{Key32, Key64, KeyError, KEY_SIZE, SIGN_KEY_SIZE};
pub use secretbox::SecretBox;
pub use sign::{Signer, Verifier, SIGNATURE_SIZE};

/// Errors returned by the encryption and signing primitives.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("key derivation failed")]
    KeyDerivationFailed,
    #[error("RNG failed")]
    RngError,
    #[error("cannot sign an empty message")]
    EmptyMessage,
    #[error("signature verification failed")]
    VerificationFailed,
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),
}
