//! Structural checks on wire messages before they are turned into domain
//! types.

use consent_crypto::Key32;

use crate::v1::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field has invalid size (expected, actual)
    InvalidSize { field: &'static str, expected: usize, actual: usize },
    /// Field exceeds its maximum length
    TooLong { field: &'static str, max: usize, actual: usize },
    /// Required field is empty
    EmptyField { field: &'static str },
    /// Field contains invalid data
    InvalidData { field: &'static str, reason: &'static str },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSize { field, expected, actual } => {
                write!(f, "field '{}' has invalid size: expected {}, got {}", field, expected, actual)
            }
            Self::TooLong { field, max, actual } => {
                write!(f, "field '{}' is {} bytes, maximum is {}", field, actual, max)
            }
            Self::EmptyField { field } => {
                write!(f, "required field '{}' is empty", field)
            }
            Self::InvalidData { field, reason } => {
                write!(f, "field '{}' contains invalid data: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, ValidationError>;

pub mod sizes {
    /// Size of keys, topics and transaction identifiers.
    pub const KEY_SIZE: usize = 32;
    /// Maximum requester display name length in bytes.
    pub const MAX_REQUESTER_LEN: usize = 256;
}

/// Check that `data` is exactly 32 bytes and convert it.
pub fn key_field(field: &'static str, data: &[u8]) -> ValidationResult<Key32> {
    Key32::from_slice(data).map_err(|_| ValidationError::InvalidSize {
        field,
        expected: sizes::KEY_SIZE,
        actual: data.len(),
    })
}

fn validate_not_empty(field: &'static str, data: &str) -> ValidationResult<()> {
    if data.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

fn validate_max_len(field: &'static str, data: &str, max: usize) -> ValidationResult<()> {
    if data.len() > max {
        return Err(ValidationError::TooLong {
            field,
            max,
            actual: data.len(),
        });
    }
    Ok(())
}

pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

impl Validate for PreTransactionRequestV1 {
    fn validate(&self) -> ValidationResult<()> {
        key_field("transaction_id", &self.transaction_id)?;
        key_field("signature_public_key", &self.signature_public_key)?;
        key_field("main_public_key", &self.main_public_key)?;
        validate_not_empty("requester", &self.requester)?;
        validate_max_len("requester", &self.requester, sizes::MAX_REQUESTER_LEN)?;
        Ok(())
    }
}

impl Validate for PreTransactionReplyV1 {
    fn validate(&self) -> ValidationResult<()> {
        Ok(())
    }
}

impl Validate for TransactionRequestV1 {
    fn validate(&self) -> ValidationResult<()> {
        key_field("transaction_id", &self.transaction_id)?;
        validate_not_empty("query", &self.query)?;
        validate_not_empty("signature", &self.signature)?;
        Ok(())
    }
}

impl Validate for TransactionReplyV1 {
    fn validate(&self) -> ValidationResult<()> {
        match (&self.content, &self.error) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (None, None) => Err(ValidationError::EmptyField { field: "content" }),
            (Some(_), Some(_)) => Err(ValidationError::InvalidData {
                field: "error",
                reason: "content and error are mutually exclusive",
            }),
        }
    }
}
