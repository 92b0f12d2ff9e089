use crate::error::{CryptoError, CryptoResult};

/// Left-to-right binary modular exponentiation over machine words.
///
/// Intermediates are widened to 128 bits so no product can overflow.
pub fn square_and_multiply(base: u64, exponent: u64, modulus: u64) -> CryptoResult<u64> {
    if modulus == 0 {
        return Err(CryptoError::ZeroModulus);
    }
    let m = u128::from(modulus);
    let b = u128::from(base) % m;

    let mut result = 1u128 % m;
    for i in (0..u64::BITS - exponent.leading_zeros()).rev() {
        result = result * result % m;
        if (exponent >> i) & 1 == 1 {
            result = result * b % m;
        }
    }
    // result < modulus
    Ok(result as u64)
}
