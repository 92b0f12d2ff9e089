//! Text interchange form of a [`SealedVote`].
//!
//! Binary fields are lowercase hex; the signature is the hex digits of the
//! integer, without leading zeros.

use evote_core::SealMode;
use num_bigint_dig::BigUint;
use num_traits::Num;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::keys::Iv;
use crate::vote::SealedVote;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRecord {
    pub mode: SealMode,
    pub iv: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciphertext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl From<&SealedVote> for SealedRecord {
    fn from(sealed: &SealedVote) -> Self {
        Self {
            mode: sealed.mode(),
            iv: sealed.iv().to_hex(),
            ciphertext: sealed.ciphertext().map(hex::encode),
            signature: sealed.signature().map(|s| s.to_str_radix(16)),
        }
    }
}

impl TryFrom<SealedRecord> for SealedVote {
    type Error = CryptoError;

    fn try_from(record: SealedRecord) -> CryptoResult<Self> {
        let iv = Iv::from_hex(&record.iv)?;
        let ciphertext = record
            .ciphertext
            .map(|ct| hex::decode(ct.trim()).map_err(|e| CryptoError::InvalidHex(e.to_string())))
            .transpose()?;
        let signature = record
            .signature
            .map(|sig| {
                BigUint::from_str_radix(sig.trim(), 16)
                    .map_err(|e| CryptoError::InvalidHex(format!("signature: {e}")))
            })
            .transpose()?;
        Ok(SealedVote::from_parts(record.mode, iv, ciphertext, signature))
    }
}
