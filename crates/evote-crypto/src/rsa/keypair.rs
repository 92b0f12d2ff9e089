use num_bigint_dig::prime::probably_prime;
use num_bigint_dig::{BigUint, ModInverse, RandBigInt};
use num_integer::Integer;
use num_traits::One;
use rand::{CryptoRng, RngCore};

use super::{to_bytes, MIN_KEY_BITS, PRIMALITY_ROUNDS};
use crate::error::{CryptoError, CryptoResult};

/// Narrowest prime factor the generator will draw. Two-bit candidates
/// collapse to the single prime 3 and could never satisfy p != q.
const MIN_FACTOR_BITS: usize = 3;

/// The public half of a key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub n: BigUint,
    pub e: BigUint,
}

impl PublicKey {
    /// Encrypt a message given as big-endian bytes.
    pub fn encrypt(&self, message: &[u8]) -> CryptoResult<BigUint> {
        self.encrypt_uint(&BigUint::from_bytes_be(message))
    }

    /// c = m^e mod n
    pub fn encrypt_uint(&self, m: &BigUint) -> CryptoResult<BigUint> {
        if m >= &self.n {
            return Err(CryptoError::ValueTooLarge { what: "message" });
        }
        Ok(m.modpow(&self.e, &self.n))
    }

    /// Check `signature^e mod n == digest`.
    ///
    /// An out-of-range signature or digest is simply a mismatch.
    pub fn verify(&self, digest: &[u8], signature: &BigUint) -> bool {
        if signature >= &self.n {
            tracing::debug!("signature is not smaller than the modulus");
            return false;
        }
        let expected = BigUint::from_bytes_be(digest);
        signature.modpow(&self.e, &self.n) == expected
    }

    pub fn modulus_bits(&self) -> usize {
        self.n.bits()
    }
}

/// A full RSA key pair.
///
/// Invariants: p and q are distinct probable primes, n = p*q,
/// phi = (p-1)(q-1), 1 < e < phi, gcd(e, phi) = 1 and e*d = 1 mod phi.
#[derive(Clone)]
pub struct KeyPair {
    p: BigUint,
    q: BigUint,
    n: BigUint,
    e: BigUint,
    d: BigUint,
    phi: BigUint,
}

impl KeyPair {
    /// Generate a key pair with a `bits`-wide modulus, split evenly between
    /// the two factors.
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(
        rng: &mut R,
        bits: usize,
        e: &BigUint,
    ) -> CryptoResult<Self> {
        if bits < MIN_KEY_BITS {
            return Err(CryptoError::KeyTooSmall {
                bits,
                min: MIN_KEY_BITS,
            });
        }
        let p_bits = bits / 2;
        let q_bits = bits - p_bits;
        Self::generate_with(rng, p_bits, q_bits, e)
    }

    /// Generate with explicit factor widths and public exponent.
    ///
    /// Does not enforce [`MIN_KEY_BITS`]; small keys are useful in tests
    /// and attack demonstrations.
    pub fn generate_with<R: RngCore + CryptoRng + ?Sized>(
        rng: &mut R,
        p_bits: usize,
        q_bits: usize,
        e: &BigUint,
    ) -> CryptoResult<Self> {
        for bits in [p_bits, q_bits] {
            if bits < MIN_FACTOR_BITS {
                return Err(CryptoError::KeyTooSmall {
                    bits,
                    min: MIN_FACTOR_BITS,
                });
            }
        }

        let p = random_prime(rng, p_bits);
        let mut q = random_prime(rng, q_bits);
        while q == p {
            tracing::debug!("drew q == p, redrawing q");
            q = random_prime(rng, q_bits);
        }

        let pair = Self::assemble(p, q, e.clone())?;
        tracing::info!(modulus_bits = pair.n.bits(), "generated RSA key pair");
        Ok(pair)
    }

    /// Build a key pair from caller-supplied factors, re-validating primality.
    pub fn from_primes(p: BigUint, q: BigUint, e: BigUint) -> CryptoResult<Self> {
        if !probably_prime(&p, PRIMALITY_ROUNDS) {
            return Err(CryptoError::NotPrime { what: "p" });
        }
        if !probably_prime(&q, PRIMALITY_ROUNDS) {
            return Err(CryptoError::NotPrime { what: "q" });
        }
        if p == q {
            return Err(CryptoError::EqualFactors);
        }
        Self::assemble(p, q, e)
    }

    /// Like [`KeyPair::from_primes`] but from decimal strings.
    pub fn from_decimal(p: &str, q: &str, e: &str) -> CryptoResult<Self> {
        Self::from_primes(parse_decimal(p)?, parse_decimal(q)?, parse_decimal(e)?)
    }

    fn assemble(p: BigUint, q: BigUint, e: BigUint) -> CryptoResult<Self> {
        let one = BigUint::one();
        let n = &p * &q;
        let phi = (&p - &one) * (&q - &one);

        if e <= one || e >= phi {
            return Err(CryptoError::ExponentOutOfRange);
        }
        if !e.gcd(&phi).is_one() {
            return Err(CryptoError::ExponentNotCoprime);
        }
        let d = e
            .clone()
            .mod_inverse(&phi)
            .and_then(|d| d.to_biguint())
            .ok_or(CryptoError::NoModularInverse)?;

        Ok(Self { p, q, n, e, d, phi })
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            n: self.n.clone(),
            e: self.e.clone(),
        }
    }

    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn q(&self) -> &BigUint {
        &self.q
    }

    pub fn n(&self) -> &BigUint {
        &self.n
    }

    pub fn e(&self) -> &BigUint {
        &self.e
    }

    pub fn d(&self) -> &BigUint {
        &self.d
    }

    pub fn phi(&self) -> &BigUint {
        &self.phi
    }

    pub fn modulus_bits(&self) -> usize {
        self.n.bits()
    }

    pub fn encrypt(&self, message: &[u8]) -> CryptoResult<BigUint> {
        self.public_key().encrypt(message)
    }

    /// m = c^d mod n
    pub fn decrypt_uint(&self, c: &BigUint) -> CryptoResult<BigUint> {
        if c >= &self.n {
            return Err(CryptoError::ValueTooLarge { what: "ciphertext" });
        }
        Ok(c.modpow(&self.d, &self.n))
    }

    /// Decrypt to the minimal big-endian byte form.
    ///
    /// Leading zero bytes of the original message are not recoverable, and
    /// a message of value zero decrypts to no bytes.
    pub fn decrypt(&self, c: &BigUint) -> CryptoResult<Vec<u8>> {
        self.decrypt_uint(c).map(|m| to_bytes(&m))
    }

    /// s = h^d mod n over an externally computed digest.
    pub fn sign(&self, digest: &[u8]) -> CryptoResult<BigUint> {
        let h = BigUint::from_bytes_be(digest);
        if h >= self.n {
            return Err(CryptoError::ValueTooLarge { what: "digest" });
        }
        Ok(h.modpow(&self.d, &self.n))
    }

    pub fn verify(&self, digest: &[u8], signature: &BigUint) -> bool {
        self.public_key().verify(digest, signature)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("n", &self.n)
            .field("e", &self.e)
            .field("d", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Parse a non-negative decimal integer, ignoring surrounding whitespace.
pub fn parse_decimal(s: &str) -> CryptoResult<BigUint> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CryptoError::InvalidNumber(s.to_string()));
    }
    s.parse::<BigUint>()
        .map_err(|e| CryptoError::InvalidNumber(format!("{s}: {e}")))
}

/// Draw odd, full-width candidates until one passes the primality test.
fn random_prime<R: RngCore + CryptoRng + ?Sized>(rng: &mut R, bits: usize) -> BigUint {
    let top = BigUint::one() << (bits - 1);
    let one = BigUint::one();
    loop {
        let candidate = rng.gen_biguint(bits) | &top | &one;
        if probably_prime(&candidate, PRIMALITY_ROUNDS) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sha2::{Digest, Sha256};

    fn small_pair() -> KeyPair {
        KeyPair::from_decimal("61", "53", "17").unwrap()
    }

    fn test_pair(seed: u64) -> KeyPair {
        let mut rng = StdRng::seed_from_u64(seed);
        KeyPair::generate_with(&mut rng, 256, 256, &BigUint::from(65537u32)).unwrap()
    }

    #[test]
    fn test_textbook_values() {
        let pair = small_pair();
        assert_eq!(pair.n(), &BigUint::from(3233u32));
        assert_eq!(pair.phi(), &BigUint::from(3120u32));
        assert_eq!(pair.d(), &BigUint::from(2753u32));

        let c = pair.public_key().encrypt_uint(&BigUint::from(65u32)).unwrap();
        assert_eq!(c, BigUint::from(2790u32));
        assert_eq!(pair.decrypt_uint(&c).unwrap(), BigUint::from(65u32));
    }

    #[test]
    fn test_generated_modulus_width() {
        let pair = test_pair(1);
        assert_eq!(pair.p().bits(), 256);
        assert_eq!(pair.q().bits(), 256);
        assert_ne!(pair.p(), pair.q());
        assert!(pair.modulus_bits() >= 511);
        assert_eq!(
            (pair.e() * pair.d()) % pair.phi(),
            BigUint::one(),
            "e*d must be 1 mod phi"
        );
    }

    #[test]
    fn test_generate_rejects_small_modulus() {
        let mut rng = StdRng::seed_from_u64(2);
        assert!(matches!(
            KeyPair::generate(&mut rng, 512, &BigUint::from(65537u32)),
            Err(CryptoError::KeyTooSmall { bits: 512, min: 1024 })
        ));
    }

    #[test]
    fn test_generate_rejects_tiny_factors() {
        let mut rng = StdRng::seed_from_u64(2);
        assert!(KeyPair::generate_with(&mut rng, 2, 8, &BigUint::from(3u32)).is_err());
    }

    #[test]
    fn test_rejects_bad_exponents() {
        let cases = [
            ("0", CryptoError::ExponentOutOfRange),
            ("1", CryptoError::ExponentOutOfRange),
            ("3120", CryptoError::ExponentOutOfRange),
            ("5000", CryptoError::ExponentOutOfRange),
            ("2", CryptoError::ExponentNotCoprime),
            ("15", CryptoError::ExponentNotCoprime),
        ];
        for (e, expected) in cases {
            let err = KeyPair::from_decimal("61", "53", e).unwrap_err();
            assert_eq!(
                std::mem::discriminant(&err),
                std::mem::discriminant(&expected),
                "e = {e}: got {err}"
            );
        }
    }

    #[test]
    fn test_rejects_composite_factor() {
        assert!(matches!(
            KeyPair::from_decimal("62", "53", "17"),
            Err(CryptoError::NotPrime { what: "p" })
        ));
        assert!(matches!(
            KeyPair::from_decimal("61", "1", "17"),
            Err(CryptoError::NotPrime { what: "q" })
        ));
    }

    #[test]
    fn test_rejects_equal_factors() {
        assert!(matches!(
            KeyPair::from_decimal("61", "61", "7"),
            Err(CryptoError::EqualFactors)
        ));
    }

    #[test]
    fn test_rejects_non_decimal() {
        assert!(matches!(
            KeyPair::from_decimal("0x3d", "53", "17"),
            Err(CryptoError::InvalidNumber(_))
        ));
        assert!(KeyPair::from_decimal("", "53", "17").is_err());
    }

    #[test]
    fn test_message_too_large() {
        let pair = small_pair();
        assert!(matches!(
            pair.encrypt(&[0xFF, 0xFF]),
            Err(CryptoError::ValueTooLarge { what: "message" })
        ));
        assert!(matches!(
            pair.decrypt_uint(&BigUint::from(3233u32)),
            Err(CryptoError::ValueTooLarge { what: "ciphertext" })
        ));
    }

    #[test]
    fn test_decrypt_zero_is_empty() {
        let pair = small_pair();
        let c = pair.encrypt(&[]).unwrap();
        assert!(pair.decrypt(&c).unwrap().is_empty());
    }

    #[test]
    fn test_byte_roundtrip() {
        let pair = test_pair(3);
        let c = pair.encrypt(b"Charlie").unwrap();
        assert_eq!(pair.decrypt(&c).unwrap(), b"Charlie");
    }

    #[test]
    fn test_sign_verify_sha256() {
        let pair = test_pair(4);
        let digest = Sha256::digest(b"ballot");
        let sig = pair.sign(&digest).unwrap();
        assert!(pair.verify(&digest, &sig));

        for bit in 0..digest.len() * 8 {
            let mut flipped = digest;
            flipped[bit / 8] ^= 1 << (bit % 8);
            assert!(!pair.verify(&flipped, &sig), "bit {bit} flip verified");
        }
    }

    #[test]
    fn test_sign_rejects_oversized_digest() {
        let pair = small_pair();
        let digest = Sha256::digest(b"ballot");
        assert!(matches!(
            pair.sign(&digest),
            Err(CryptoError::ValueTooLarge { what: "digest" })
        ));
    }

    #[test]
    fn test_verify_rejects_oversized_signature() {
        let pair = small_pair();
        let huge = pair.n() + BigUint::one();
        assert!(!pair.verify(&[1], &huge));
    }

    #[test]
    fn test_debug_redacts_private_exponent() {
        let shown = format!("{:?}", small_pair());
        assert!(shown.contains("REDACTED"));
        assert!(!shown.contains("2753"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn textbook_roundtrip(m in 0u32..3233) {
            let pair = small_pair();
            let m = BigUint::from(m);
            let c = pair.public_key().encrypt_uint(&m).unwrap();
            prop_assert_eq!(pair.decrypt_uint(&c).unwrap(), m);
        }

        #[test]
        fn generated_pair_roundtrip(seed in any::<u64>(), raw in any::<[u8; 16]>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let e = BigUint::from(65537u32);
            let generated = KeyPair::generate_with(&mut rng, 64, 64, &e);
            prop_assume!(!matches!(generated, Err(CryptoError::ExponentNotCoprime)));
            let pair = generated.unwrap();

            let m = BigUint::from_bytes_be(&raw) % pair.n();
            let c = pair.public_key().encrypt_uint(&m).unwrap();
            prop_assert_eq!(pair.decrypt_uint(&c).unwrap(), m);
        }
    }
}
