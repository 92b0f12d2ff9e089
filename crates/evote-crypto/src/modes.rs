//! Block chaining modes over arbitrary byte buffers.
//!
//! - ECB: independent blocks, zero-padded tail. Bulk demonstrations only.
//! - CBC: chained blocks, block-aligned input.
//! - CTS: CBC with ciphertext stealing for lengths that are not
//!   block-aligned; output is exactly as long as the input.
//!
//! CTS layout for `n` full blocks followed by `r` tail bytes:
//! ```text
//! C_1 .. C_{n-1}  plain CBC of P_1 .. P_{n-1}
//! C'              = E(P_n ^ C_{n-1})          (IV when n == 1)
//! C_n             = E((P_tail || 0..) ^ C')
//! output          = C_1 .. C_{n-1} || C_n || C'[..r]
//! ```

use crate::des::{Block, DesCipher};
use crate::error::{alloc_buffer, CryptoError, CryptoResult};
use crate::keys::Iv;
use crate::BLOCK_SIZE;

/// Encrypt every block independently, zero-padding a final partial block.
///
/// The output is rounded up to a whole number of blocks, so a non-aligned
/// input cannot be recovered to its exact length.
pub fn ecb_encrypt(cipher: &DesCipher, data: &[u8]) -> CryptoResult<Vec<u8>> {
    let padded_len = data.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
    let mut out = alloc_buffer(padded_len)?;

    let mut chunks = data.chunks_exact(BLOCK_SIZE);
    for chunk in chunks.by_ref() {
        out.extend_from_slice(&cipher.encrypt_block(&to_block(chunk)));
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        out.extend_from_slice(&cipher.encrypt_block(&zero_padded(tail)));
    }
    Ok(out)
}

/// Decrypt block-aligned ECB data.
pub fn ecb_decrypt(cipher: &DesCipher, data: &[u8]) -> CryptoResult<Vec<u8>> {
    require_aligned(data.len())?;
    let mut out = alloc_buffer(data.len())?;
    for chunk in data.chunks_exact(BLOCK_SIZE) {
        out.extend_from_slice(&cipher.decrypt_block(&to_block(chunk)));
    }
    Ok(out)
}

/// CBC-encrypt block-aligned data.
pub fn cbc_encrypt(cipher: &DesCipher, iv: &Iv, data: &[u8]) -> CryptoResult<Vec<u8>> {
    require_aligned(data.len())?;
    let mut out = alloc_buffer(data.len())?;
    cbc_encrypt_into(cipher, *iv.as_bytes(), data, &mut out);
    Ok(out)
}

/// CBC-decrypt block-aligned data.
pub fn cbc_decrypt(cipher: &DesCipher, iv: &Iv, data: &[u8]) -> CryptoResult<Vec<u8>> {
    require_aligned(data.len())?;
    let mut out = alloc_buffer(data.len())?;
    cbc_decrypt_into(cipher, *iv.as_bytes(), data, &mut out);
    Ok(out)
}

/// CBC over the whole blocks of `data`; a trailing partial block is copied
/// through unencrypted. Used for bulk demonstrations where the output must
/// keep the input length.
pub fn cbc_encrypt_bulk(cipher: &DesCipher, iv: &Iv, data: &[u8]) -> CryptoResult<Vec<u8>> {
    let aligned = data.len() - data.len() % BLOCK_SIZE;
    let mut out = alloc_buffer(data.len())?;
    cbc_encrypt_into(cipher, *iv.as_bytes(), &data[..aligned], &mut out);
    out.extend_from_slice(&data[aligned..]);
    Ok(out)
}

/// Encrypt with ciphertext stealing.
///
/// Aligned input is plain CBC. Input shorter than one block is rejected.
pub fn cts_encrypt(cipher: &DesCipher, iv: &Iv, data: &[u8]) -> CryptoResult<Vec<u8>> {
    if data.len() < BLOCK_SIZE {
        return Err(CryptoError::TooShortForStealing { len: data.len() });
    }
    if data.len() % BLOCK_SIZE == 0 {
        return cbc_encrypt(cipher, iv, data);
    }

    let full = data.len() / BLOCK_SIZE;
    let tail_len = data.len() % BLOCK_SIZE;
    let head_len = (full - 1) * BLOCK_SIZE;

    let mut out = alloc_buffer(data.len())?;
    let chain = cbc_encrypt_into(cipher, *iv.as_bytes(), &data[..head_len], &mut out);

    let penultimate = to_block(&data[head_len..head_len + BLOCK_SIZE]);
    let stolen = cipher.encrypt_block(&xor(&penultimate, &chain));

    let last = zero_padded(&data[full * BLOCK_SIZE..]);
    let final_block = cipher.encrypt_block(&xor(&last, &stolen));

    out.extend_from_slice(&final_block);
    out.extend_from_slice(&stolen[..tail_len]);
    tracing::trace!(len = data.len(), tail_len, "cts encrypt");
    Ok(out)
}

/// Invert [`cts_encrypt`].
pub fn cts_decrypt(cipher: &DesCipher, iv: &Iv, data: &[u8]) -> CryptoResult<Vec<u8>> {
    if data.len() < BLOCK_SIZE {
        return Err(CryptoError::TooShortForStealing { len: data.len() });
    }
    if data.len() % BLOCK_SIZE == 0 {
        return cbc_decrypt(cipher, iv, data);
    }

    let full = data.len() / BLOCK_SIZE;
    let tail_len = data.len() % BLOCK_SIZE;
    let head_len = (full - 1) * BLOCK_SIZE;

    let mut out = alloc_buffer(data.len())?;
    let chain = cbc_decrypt_into(cipher, *iv.as_bytes(), &data[..head_len], &mut out);

    let final_block = to_block(&data[head_len..head_len + BLOCK_SIZE]);
    let truncated = &data[full * BLOCK_SIZE..];

    // D(C_n) = (P_tail || 0..) ^ C', so its trailing bytes are C'[r..]
    let opened = cipher.decrypt_block(&final_block);
    let mut stolen = opened;
    stolen[..tail_len].copy_from_slice(truncated);

    let penultimate = xor(&cipher.decrypt_block(&stolen), &chain);
    out.extend_from_slice(&penultimate);
    out.extend(
        opened[..tail_len]
            .iter()
            .zip(truncated)
            .map(|(a, b)| a ^ b),
    );
    Ok(out)
}

/// CBC-encrypt aligned `data` onto `out`; returns the final chain value.
fn cbc_encrypt_into(cipher: &DesCipher, iv: Block, data: &[u8], out: &mut Vec<u8>) -> Block {
    data.chunks_exact(BLOCK_SIZE).fold(iv, |chain, chunk| {
        let encrypted = cipher.encrypt_block(&xor(&to_block(chunk), &chain));
        out.extend_from_slice(&encrypted);
        encrypted
    })
}

/// CBC-decrypt aligned `data` onto `out`; returns the last ciphertext block
/// (or the IV when `data` is empty).
fn cbc_decrypt_into(cipher: &DesCipher, iv: Block, data: &[u8], out: &mut Vec<u8>) -> Block {
    data.chunks_exact(BLOCK_SIZE).fold(iv, |chain, chunk| {
        let current = to_block(chunk);
        out.extend_from_slice(&xor(&cipher.decrypt_block(&current), &chain));
        current
    })
}

fn require_aligned(len: usize) -> CryptoResult<()> {
    if len % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidLength {
            len,
            block: BLOCK_SIZE,
        });
    }
    Ok(())
}

fn to_block(chunk: &[u8]) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    block.copy_from_slice(chunk);
    block
}

fn zero_padded(tail: &[u8]) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    block[..tail.len()].copy_from_slice(tail);
    block
}

fn xor(a: &Block, b: &Block) -> Block {
    let mut out = [0u8; BLOCK_SIZE];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b)) {
        *o = x ^ y;
    }
    out
}
