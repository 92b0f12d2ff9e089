//! Plain-text key-pair interchange.
//!
//! ```text
//! p = <decimal>
//! q = <decimal>
//! e = <decimal>
//! ```
//!
//! Labels must appear in that order. The private exponent is never stored;
//! loading recomputes it and re-validates both factors.

use num_bigint_dig::BigUint;

use super::keypair::{parse_decimal, KeyPair};
use crate::error::{CryptoError, CryptoResult};

const LABELS: [&str; 3] = ["p", "q", "e"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFile {
    pub p: BigUint,
    pub q: BigUint,
    pub e: BigUint,
}

impl KeyFile {
    pub fn from_key_pair(pair: &KeyPair) -> Self {
        Self {
            p: pair.p().clone(),
            q: pair.q().clone(),
            e: pair.e().clone(),
        }
    }

    pub fn render(&self) -> String {
        format!("p = {}\nq = {}\ne = {}\n", self.p, self.q, self.e)
    }

    pub fn parse(text: &str) -> CryptoResult<Self> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let mut values = Vec::with_capacity(LABELS.len());

        for label in LABELS {
            let line = lines
                .next()
                .ok_or_else(|| CryptoError::KeyFile(format!("missing '{label}' line")))?;
            let (found, value) = line.split_once('=').ok_or_else(|| {
                CryptoError::KeyFile(format!("expected '{label} = ...', got '{line}'"))
            })?;
            if found.trim() != label {
                return Err(CryptoError::KeyFile(format!(
                    "expected label '{label}', got '{}'",
                    found.trim()
                )));
            }
            values.push(parse_decimal(value)?);
        }
        if let Some(extra) = lines.next() {
            return Err(CryptoError::KeyFile(format!("unexpected trailing line '{extra}'")));
        }

        let mut values = values.into_iter();
        match (values.next(), values.next(), values.next()) {
            (Some(p), Some(q), Some(e)) => Ok(Self { p, q, e }),
            _ => Err(CryptoError::KeyFile("incomplete key file".into())),
        }
    }

    /// Rebuild the full key pair, re-checking primality and the exponent.
    pub fn into_key_pair(self) -> CryptoResult<KeyPair> {
        KeyPair::from_primes(self.p, self.q, self.e)
    }
}
