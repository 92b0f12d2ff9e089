//! Fixed-width symmetric key material: DES keys and chaining IVs.
//!
//! Both are 8 raw bytes with a 16-character lowercase hex text form.

use rand::{CryptoRng, RngCore};

use crate::error::{CryptoError, CryptoResult};
use crate::BLOCK_SIZE;

/// A 64-bit DES key (parity bits included, ignored by the schedule).
#[derive(Clone, PartialEq, Eq)]
pub struct DesKey {
    bytes: [u8; BLOCK_SIZE],
}

impl DesKey {
    pub fn from_bytes(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.bytes
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        decode_block(s).map(Self::from_bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl std::fmt::Debug for DesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Initialization vector for chained modes. Not secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Iv {
    bytes: [u8; BLOCK_SIZE],
}

impl Iv {
    pub fn from_bytes(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.bytes
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        decode_block(s).map(Self::from_bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

/// Draw a random DES key.
pub fn generate_des_key<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> DesKey {
    let mut bytes = [0u8; BLOCK_SIZE];
    rng.fill_bytes(&mut bytes);
    DesKey::from_bytes(bytes)
}

/// Draw a random IV.
pub fn generate_iv<R: RngCore + CryptoRng + ?Sized>(rng: &mut R) -> Iv {
    let mut bytes = [0u8; BLOCK_SIZE];
    rng.fill_bytes(&mut bytes);
    Iv::from_bytes(bytes)
}

fn decode_block(s: &str) -> CryptoResult<[u8; BLOCK_SIZE]> {
    let s = s.trim();
    if s.len() != BLOCK_SIZE * 2 {
        return Err(CryptoError::InvalidHex(format!(
            "expected {} hex characters, got {}",
            BLOCK_SIZE * 2,
            s.len()
        )));
    }
    let mut out = [0u8; BLOCK_SIZE];
    hex::decode_to_slice(s, &mut out).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
    Ok(out)
}
