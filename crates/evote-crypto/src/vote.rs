//! Hybrid vote sealing: seal then verify.
//!
//! Confidentiality encrypts the ballot with DES under a caller-supplied IV.
//! Authentication signs the SHA-256 digest of either the ciphertext (mode
//! `Both`) or the raw ballot (mode `Authentication`) with RSA.
//!
//! Length classification for the encryption branch:
//! ```text
//! len == 0            EmptyMessage
//! 0 < len < 8         pad to one block (pad value = pad byte count), CBC
//! len % 8 == 0        CBC, no padding
//! otherwise           CBC with ciphertext stealing
//! ```

use evote_core::SealMode;
use num_bigint_dig::BigUint;
use sha2::{Digest, Sha256};

use crate::des::DesCipher;
use crate::error::{alloc_buffer, CryptoError, CryptoResult};
use crate::keys::{DesKey, Iv};
use crate::modes::{cbc_decrypt, cbc_encrypt, cts_decrypt, cts_encrypt};
use crate::rsa::KeyPair;
use crate::BLOCK_SIZE;

/// Key material shared by sealer and verifier. Each mode needs only its half.
#[derive(Debug, Clone, Default)]
pub struct SealingKeys {
    pub des: Option<DesKey>,
    pub rsa: Option<KeyPair>,
}

impl SealingKeys {
    fn des(&self) -> CryptoResult<&DesKey> {
        self.des.as_ref().ok_or(CryptoError::MissingField("DES key"))
    }

    fn rsa(&self) -> CryptoResult<&KeyPair> {
        self.rsa.as_ref().ok_or(CryptoError::MissingField("RSA key pair"))
    }
}

/// A sealed ballot: mode, IV, and whichever of ciphertext and signature the
/// mode calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedVote {
    mode: SealMode,
    iv: Iv,
    ciphertext: Option<Vec<u8>>,
    signature: Option<BigUint>,
}

impl SealedVote {
    /// Reassemble a record received from elsewhere. Nothing is checked until
    /// [`verify`].
    pub fn from_parts(
        mode: SealMode,
        iv: Iv,
        ciphertext: Option<Vec<u8>>,
        signature: Option<BigUint>,
    ) -> Self {
        Self {
            mode,
            iv,
            ciphertext,
            signature,
        }
    }

    pub fn into_parts(self) -> (SealMode, Iv, Option<Vec<u8>>, Option<BigUint>) {
        (self.mode, self.iv, self.ciphertext, self.signature)
    }

    pub fn mode(&self) -> SealMode {
        self.mode
    }

    pub fn iv(&self) -> &Iv {
        &self.iv
    }

    pub fn ciphertext(&self) -> Option<&[u8]> {
        self.ciphertext.as_deref()
    }

    pub fn signature(&self) -> Option<&BigUint> {
        self.signature.as_ref()
    }
}

/// Outcome of [`verify`]. A bad signature is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The seal checked out; `message` is the recovered (or, for
    /// authentication-only seals, the claimed) ballot.
    Verified { message: Vec<u8> },
    SignatureMismatch,
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified { .. })
    }
}

/// Seal `message` under `mode`.
///
/// Any failure discards the partial record; the caller never sees a
/// half-populated [`SealedVote`].
pub fn seal(
    mode: SealMode,
    message: &[u8],
    keys: &SealingKeys,
    iv: Iv,
) -> CryptoResult<SealedVote> {
    let ciphertext = if mode.encrypts() {
        let cipher = DesCipher::new(keys.des()?);
        Some(encrypt_ballot(&cipher, &iv, message)?)
    } else {
        None
    };

    let signature = if mode.signs() {
        let signed_data = match &ciphertext {
            Some(ct) => ct.as_slice(),
            None => message,
        };
        if signed_data.is_empty() {
            return Err(CryptoError::EmptyMessage);
        }
        let digest = Sha256::digest(signed_data);
        Some(keys.rsa()?.sign(&digest)?)
    } else {
        None
    };

    tracing::info!(
        %mode,
        len = message.len(),
        ciphertext_len = ciphertext.as_ref().map(Vec::len),
        "sealed vote"
    );
    Ok(SealedVote {
        mode,
        iv,
        ciphertext,
        signature,
    })
}

/// Verify a sealed ballot and recover its contents.
///
/// `claimed_message` is the ballot the verifier is checking against; it is
/// required only for authentication-only seals, where no ciphertext exists.
pub fn verify(
    sealed: &SealedVote,
    keys: &SealingKeys,
    claimed_message: Option<&[u8]>,
) -> CryptoResult<Verification> {
    if sealed.mode.signs() {
        let signature = sealed
            .signature
            .as_ref()
            .ok_or(CryptoError::MissingField("signature"))?;
        let signed_data = if sealed.mode.encrypts() {
            sealed
                .ciphertext
                .as_deref()
                .ok_or(CryptoError::MissingField("ciphertext"))?
        } else {
            claimed_message.ok_or(CryptoError::MissingField("claimed message"))?
        };
        let digest = Sha256::digest(signed_data);
        if !keys.rsa()?.verify(&digest, signature) {
            tracing::warn!(mode = %sealed.mode, "vote signature mismatch");
            return Ok(Verification::SignatureMismatch);
        }
        tracing::debug!("vote signature verified");
    }

    let message = if sealed.mode.encrypts() {
        let ciphertext = sealed
            .ciphertext
            .as_deref()
            .ok_or(CryptoError::MissingField("ciphertext"))?;
        let cipher = DesCipher::new(keys.des()?);
        decrypt_ballot(&cipher, &sealed.iv, ciphertext)?
    } else {
        let claimed = claimed_message.ok_or(CryptoError::MissingField("claimed message"))?;
        let mut owned = alloc_buffer(claimed.len())?;
        owned.extend_from_slice(claimed);
        owned
    };

    tracing::info!(mode = %sealed.mode, "vote verified");
    Ok(Verification::Verified { message })
}

fn encrypt_ballot(cipher: &DesCipher, iv: &Iv, message: &[u8]) -> CryptoResult<Vec<u8>> {
    match message.len() {
        0 => Err(CryptoError::EmptyMessage),
        len if len < BLOCK_SIZE => {
            tracing::debug!(len, "padding short ballot to one block");
            cbc_encrypt(cipher, iv, &pad_block(message))
        }
        len if len % BLOCK_SIZE == 0 => cbc_encrypt(cipher, iv, message),
        _ => cts_encrypt(cipher, iv, message),
    }
}

fn decrypt_ballot(cipher: &DesCipher, iv: &Iv, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    if ciphertext.len() % BLOCK_SIZE == 0 {
        let mut plain = cbc_decrypt(cipher, iv, ciphertext)?;
        if plain.len() == BLOCK_SIZE {
            strip_padding(&mut plain);
        }
        Ok(plain)
    } else {
        cts_decrypt(cipher, iv, ciphertext)
    }
}

/// Pad `0 < len < 8` bytes to a full block; each pad byte holds the pad count.
fn pad_block(message: &[u8]) -> [u8; BLOCK_SIZE] {
    let pad = (BLOCK_SIZE - message.len()) as u8;
    let mut block = [pad; BLOCK_SIZE];
    block[..message.len()].copy_from_slice(message);
    block
}

/// Remove padding added by [`pad_block`], if the trailing bytes look like it.
///
/// An unpadded 8-byte ballot ending in such a run is indistinguishable from a
/// padded one and loses those bytes.
fn strip_padding(block: &mut Vec<u8>) {
    let Some(&pad) = block.last() else { return };
    let pad_len = usize::from(pad);
    if (1..BLOCK_SIZE).contains(&pad_len)
        && block[BLOCK_SIZE - pad_len..].iter().all(|&b| b == pad)
    {
        block.truncate(BLOCK_SIZE - pad_len);
    }
}
