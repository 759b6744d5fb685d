//! Constant-time comparison helpers.
//!
//! Key types derive byte-wise `PartialEq`, which returns early on the first
//! differing byte. Use these helpers when comparing secrets or MACs.

use constant_time_eq::constant_time_eq;

/// Compare two byte slices in constant time.
///
/// ```rust
/// use consent_crypto::utils::constant_time_compare;
///
/// assert!(constant_time_compare(b"same", b"same"));
/// assert!(!constant_time_compare(b"same", b"diff"));
/// ```
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    constant_time_eq(a, b)
}

/// Compare two fixed-size arrays in constant time.
pub fn constant_time_compare_array<const N: usize>(a: &[u8; N], b: &[u8; N]) -> bool {
    constant_time_eq(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare_different_length() {
        assert!(!constant_time_compare(b"hello", b"hello world"));
    }

    #[test]
    fn test_constant_time_compare_array_different() {
        let a = [0u8; 32];
        let mut b = [0u8; 32];
        b[31] = 1;
        assert!(!constant_time_compare_array(&a, &b));
        assert!(constant_time_compare_array(&a, &a));
    }
}
