//! DES key schedule: 64-bit master key → sixteen 48-bit subkeys.

use super::tables::{KEY_SHIFTS, PC1, PC2};
use crate::permute::{permute, rotate_left_28};

pub const ROUNDS: usize = 16;

/// The sixteen round subkeys derived from one master key, in encryption order.
#[derive(Clone, PartialEq, Eq)]
pub struct RoundKeys([u64; ROUNDS]);

impl RoundKeys {
    /// Derive the subkeys. Parity bits of the master key are ignored.
    pub fn derive(master: u64) -> Self {
        let permuted = permute(master, &PC1, 64);
        let mut c = (permuted >> 28) as u32;
        let mut d = (permuted & 0x0FFF_FFFF) as u32;

        let mut keys = [0u64; ROUNDS];
        for (key, &shift) in keys.iter_mut().zip(KEY_SHIFTS.iter()) {
            c = rotate_left_28(c, shift);
            d = rotate_left_28(d, shift);
            *key = permute((u64::from(c) << 28) | u64::from(d), &PC2, 56);
        }
        Self(keys)
    }

    pub fn get(&self, round: usize) -> u64 {
        self.0[round]
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = u64> + '_ {
        self.0.iter().copied()
    }
}

impl std::fmt::Debug for RoundKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundKeys")
            .field("keys", &"[REDACTED]")
            .finish()
    }
}
