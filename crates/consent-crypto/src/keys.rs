//! Fixed-size key material.
//!
//! [`Key32`] carries public keys, transaction identifiers and topic sentinels.
//! It is ordered and hashed by its raw bytes so it can key maps directly.
//! The derived `PartialEq` is NOT constant-time; compare secrets with
//! [`Key32::ct_eq`].
//!
//! [`Key64`] carries Ed25519 keypair bytes (seed || public key). Its `Debug`
//! output is redacted and the buffer is zeroized on drop.

use std::fmt;
use std::str::FromStr;

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::utils::constant_time_compare_array;

/// Size of a [`Key32`] in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of a [`Key64`] in bytes.
pub const SIGN_KEY_SIZE: usize = 64;

/// Error type for key parsing.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("invalid key encoding: {0}")]
    InvalidEncoding(String),
}

/// 32-byte key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Key32([u8; KEY_SIZE]);

impl Key32 {
    /// Wrap raw bytes.
    pub const fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Cryptographically random key, used for transaction IDs.
    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; KEY_SIZE] = raw.try_into().map_err(|_| KeyError::InvalidLength {
            expected: KEY_SIZE,
            got: raw.len(),
        })?;
        Ok(Self(bytes))
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(raw: &str) -> Result<Self, KeyError> {
        decode_hex::<KEY_SIZE>(raw).map(Self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Constant-time equality.
    pub fn ct_eq(&self, other: &Key32) -> bool {
        constant_time_compare_array(&self.0, &other.0)
    }
}

impl From<[u8; KEY_SIZE]> for Key32 {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Key32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Key32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Key32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key32({})", self.to_hex())
    }
}

impl FromStr for Key32 {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Key32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Key32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// 64-byte signing key material.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Key64([u8; SIGN_KEY_SIZE]);

impl Key64 {
    pub const fn new(bytes: [u8; SIGN_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; SIGN_KEY_SIZE] = raw.try_into().map_err(|_| KeyError::InvalidLength {
            expected: SIGN_KEY_SIZE,
            got: raw.len(),
        })?;
        Ok(Self(bytes))
    }

    /// Parse a 128-character hex string.
    pub fn from_hex(raw: &str) -> Result<Self, KeyError> {
        decode_hex::<SIGN_KEY_SIZE>(raw).map(Self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; SIGN_KEY_SIZE] {
        &self.0
    }

    pub fn ct_eq(&self, other: &Key64) -> bool {
        constant_time_compare_array(&self.0, &other.0)
    }
}

impl fmt::Debug for Key64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key64(<redacted>)")
    }
}

fn decode_hex<const N: usize>(raw: &str) -> Result<[u8; N], KeyError> {
    if raw.len() != 2 * N {
        return Err(KeyError::InvalidLength {
            expected: 2 * N,
            got: raw.len(),
        });
    }
    let mut out = [0u8; N];
    hex::decode_to_slice(raw, &mut out).map_err(|e| KeyError::InvalidEncoding(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_keys_differ() {
        let a = Key32::random();
        let b = Key32::random();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hex_round_trip() {
        let key = Key32::random();
        let s = key.to_string();
        assert_eq!(s.len(), 64);
        assert_eq!(Key32::from_hex(&s).unwrap(), key);
        assert_eq!(s.parse::<Key32>().unwrap(), key);
    }

    #[test]
    fn test_from_hex_wrong_length() {
        let err = Key32::from_hex("abcd").unwrap_err();
        assert_eq!(err, KeyError::InvalidLength { expected: 64, got: 4 });
    }

    #[test]
    fn test_from_hex_bad_encoding() {
        let raw = "zz".repeat(32);
        assert!(matches!(
            Key32::from_hex(&raw),
            Err(KeyError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_from_slice_length() {
        assert!(Key32::from_slice(&[0u8; 31]).is_err());
        assert!(Key32::from_slice(&[0u8; 33]).is_err());
        assert_eq!(Key32::from_slice(&[7u8; 32]).unwrap(), Key32::new([7u8; 32]));
    }

    #[test]
    fn test_key64_hex_round_trip() {
        let key = Key64::new([0x5a; 64]);
        let s = key.to_hex();
        assert_eq!(s.len(), 128);
        assert_eq!(Key64::from_hex(&s).unwrap(), key);
        assert!(Key64::from_hex(&s[..126]).is_err());
    }

    #[test]
    fn test_key64_debug_redacted() {
        let key = Key64::new([0x5a; 64]);
        let dbg = format!("{:?}", key);
        assert!(!dbg.contains("5a5a"));
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let mut low = [0u8; 32];
        let mut high = [0u8; 32];
        low[0] = 1;
        high[0] = 2;
        assert!(Key32::new(low) < Key32::new(high));
    }

    #[test]
    fn test_ct_eq_matches_eq() {
        let a = Key32::random();
        let b = a;
        assert!(a.ct_eq(&b));
        assert!(!a.ct_eq(&Key32::random()));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let key = Key32::random();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", key.to_hex()));
        let back: Key32 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
