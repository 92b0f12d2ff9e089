//! DES block cipher (FIPS 46-3) over single 64-bit blocks.
//!
//! Decryption runs the same Feistel network with the subkeys reversed.

pub mod schedule;
pub mod tables;

pub use schedule::RoundKeys;

use crate::keys::DesKey;
use crate::permute::permute;
use crate::BLOCK_SIZE;
use tables::{E, FP, IP, P, SBOXES};

/// One 64-bit block in big-endian byte order.
pub type Block = [u8; BLOCK_SIZE];

/// A keyed DES instance. Holds only the derived round keys.
#[derive(Clone, Debug)]
pub struct DesCipher {
    keys: RoundKeys,
}

impl DesCipher {
    pub fn new(key: &DesKey) -> Self {
        Self::from_u64(u64::from_be_bytes(*key.as_bytes()))
    }

    pub fn from_u64(key: u64) -> Self {
        Self {
            keys: RoundKeys::derive(key),
        }
    }

    pub fn round_keys(&self) -> &RoundKeys {
        &self.keys
    }

    pub fn encrypt_u64(&self, block: u64) -> u64 {
        feistel(block, self.keys.iter())
    }

    pub fn decrypt_u64(&self, block: u64) -> u64 {
        feistel(block, self.keys.iter().rev())
    }

    pub fn encrypt_block(&self, block: &Block) -> Block {
        self.encrypt_u64(u64::from_be_bytes(*block)).to_be_bytes()
    }

    pub fn decrypt_block(&self, block: &Block) -> Block {
        self.decrypt_u64(u64::from_be_bytes(*block)).to_be_bytes()
    }
}

fn feistel(block: u64, subkeys: impl Iterator<Item = u64>) -> u64 {
    let block = permute(block, &IP, 64);
    let mut left = (block >> 32) as u32;
    let mut right = block as u32;

    for subkey in subkeys {
        let next = left ^ round_function(right, subkey);
        left = right;
        right = next;
    }

    // the halves are swapped once more after the last round
    let preoutput = (u64::from(right) << 32) | u64::from(left);
    permute(preoutput, &FP, 64)
}

/// The DES `f` function: expand, mix the subkey, substitute, permute.
fn round_function(half: u32, subkey: u64) -> u32 {
    let mixed = permute(u64::from(half), &E, 32) ^ subkey;

    let substituted = SBOXES.iter().enumerate().fold(0u32, |acc, (i, sbox)| {
        let group = ((mixed >> (42 - 6 * i)) & 0x3F) as usize;
        let row = ((group & 0x20) >> 4) | (group & 0x01);
        let col = (group >> 1) & 0x0F;
        (acc << 4) | u32::from(sbox[row][col])
    });

    permute(u64::from(substituted), &P, 32) as u32
}
