//! Per-party key bundle.

use std::fmt;

use crate::asymmetric::CryptoBox;
use crate::keys::Key32;
use crate::sign::Signer;

/// Main, storage and signature key pairs generated together.
///
/// The main public key is the party's address on the wire. The storage pair
/// is reserved for local data encryption. The keychain is immutable once
/// created.
#[derive(Clone)]
pub struct Keychain {
    main: CryptoBox,
    storage: CryptoBox,
    signature: Signer,
}

impl Keychain {
    /// Generate a fresh keychain for one session.
    pub fn generate() -> Self {
        Self {
            main: CryptoBox::generate(),
            storage: CryptoBox::generate(),
            signature: Signer::generate(),
        }
    }

    pub fn main_public_key(&self) -> Key32 {
        *self.main.public_key()
    }

    pub fn storage_public_key(&self) -> Key32 {
        *self.storage.public_key()
    }

    pub fn signature_public_key(&self) -> Key32 {
        self.signature.public_key()
    }

    pub fn main_box(&self) -> &CryptoBox {
        &self.main
    }

    pub fn storage_box(&self) -> &CryptoBox {
        &self.storage
    }

    pub fn signer(&self) -> &Signer {
        &self.signature
    }
}

impl fmt::Debug for Keychain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keychain")
            .field("main", &self.main_public_key())
            .field("storage", &self.storage_public_key())
            .field("signature", &self.signature_public_key())
            .finish()
    }
}
