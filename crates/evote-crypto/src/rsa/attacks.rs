//! Attacks on unpadded RSA.
//!
//! Each helper works only because [`PublicKey::encrypt`] is deterministic and
//! multiplicative. They exist to demonstrate that, nothing more.

use num_bigint_dig::BigUint;

use super::keypair::PublicKey;
use crate::error::{CryptoError, CryptoResult};

/// Numeric size of a message once interpreted as a big-endian integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMagnitude {
    pub value: BigUint,
    pub bits: usize,
}

/// Multiply a ciphertext by an encrypted factor: c * s^e mod n.
///
/// Decrypting the result yields m * s mod n without ever seeing m.
pub fn malleate(pk: &PublicKey, c: &BigUint, s: &BigUint) -> CryptoResult<BigUint> {
    if c >= &pk.n {
        return Err(CryptoError::ValueTooLarge { what: "ciphertext" });
    }
    let factor = pk.encrypt_uint(s)?;
    Ok((c * factor) % &pk.n)
}

/// Find which candidate encrypts to `c` by encrypting each one.
///
/// Candidates too large for the modulus are skipped.
pub fn recover_from_dictionary<I, T>(pk: &PublicKey, c: &BigUint, candidates: I) -> Option<T>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    candidates.into_iter().enumerate().find_map(|(i, candidate)| {
        match pk.encrypt(candidate.as_ref()) {
            Ok(guess) if &guess == c => {
                tracing::debug!(attempts = i + 1, "dictionary match");
                Some(candidate)
            }
            _ => None,
        }
    })
}

pub fn message_magnitude(message: &[u8]) -> MessageMagnitude {
    let value = BigUint::from_bytes_be(message);
    let bits = value.bits();
    MessageMagnitude { value, bits }
}
