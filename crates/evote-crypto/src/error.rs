//! Error taxonomy for the primitives and the sealing protocol.
//!
//! A signature mismatch is not an error: verification reports it as a
//! boolean or a [`crate::vote::Verification`] outcome.

use std::collections::TryReserveError;
use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Broad class of a [`CryptoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A precondition on the inputs did not hold.
    Validation,
    /// Buffer storage could not be reserved.
    Allocation,
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("{what} is not prime")]
    NotPrime { what: &'static str },

    #[error("prime factors p and q must differ")]
    EqualFactors,

    #[error("public exponent must satisfy 1 < e < phi(n)")]
    ExponentOutOfRange,

    #[error("public exponent must be coprime to phi(n)")]
    ExponentNotCoprime,

    #[error("no modular inverse of e modulo phi(n)")]
    NoModularInverse,

    #[error("{what} is too large for the modulus")]
    ValueTooLarge { what: &'static str },

    #[error("modulus must be non-zero")]
    ZeroModulus,

    #[error("message is empty")]
    EmptyMessage,

    #[error("ciphertext stealing needs at least one full block, got {len} bytes")]
    TooShortForStealing { len: usize },

    #[error("buffer length {len} is not a multiple of the {block}-byte block")]
    InvalidLength { len: usize, block: usize },

    #[error("key size must be at least {min} bits, got {bits}")]
    KeyTooSmall { bits: usize, min: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid decimal integer: {0}")]
    InvalidNumber(String),

    #[error("key file: {0}")]
    KeyFile(String),

    #[error("{0} is required for this seal mode")]
    MissingField(&'static str),

    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
}

impl CryptoError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CryptoError::Allocation(_) => ErrorClass::Allocation,
            _ => ErrorClass::Validation,
        }
    }
}

/// Reserve an empty buffer able to hold `len` bytes without reallocating.
pub(crate) fn alloc_buffer(len: usize) -> CryptoResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_class() {
        assert_eq!(CryptoError::EmptyMessage.class(), ErrorClass::Validation);
        assert_eq!(
            CryptoError::ValueTooLarge { what: "digest" }.class(),
            ErrorClass::Validation
        );
    }

    #[test]
    fn test_allocation_class() {
        let err = Vec::<u8>::new().try_reserve_exact(usize::MAX).unwrap_err();
        assert_eq!(CryptoError::from(err).class(), ErrorClass::Allocation);
    }

    #[test]
    fn test_alloc_buffer_capacity() {
        let buf = alloc_buffer(24).unwrap();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 24);
    }

    #[test]
    fn test_display() {
        let err = CryptoError::TooShortForStealing { len: 5 };
        assert_eq!(
            err.to_string(),
            "ciphertext stealing needs at least one full block, got 5 bytes"
        );
    }
}
