//! Textbook RSA: key generation, raw encrypt/decrypt, sign/verify.
//!
//! No padding scheme is applied. Messages are interpreted as big-endian
//! unsigned integers and must be numerically smaller than the modulus.
//! [`attacks`] shows what that costs.

pub mod attacks;
pub mod keyfile;
pub mod keypair;
pub mod sqmul;

pub use keyfile::KeyFile;
pub use keypair::{parse_decimal, KeyPair, PublicKey};
pub use sqmul::square_and_multiply;

use num_bigint_dig::BigUint;
use num_traits::Zero;

/// Smallest modulus [`KeyPair::generate`] accepts.
pub const MIN_KEY_BITS: usize = 1024;

/// Default public exponent (F4).
pub const DEFAULT_PUBLIC_EXPONENT: u32 = 65537;

/// Miller-Rabin rounds per prime candidate.
pub const PRIMALITY_ROUNDS: usize = 40;

/// Big-endian byte encoding of a value. Zero encodes as no bytes.
pub(crate) fn to_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}
