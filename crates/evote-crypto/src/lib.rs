//! evote-crypto: primitives and the vote-sealing protocol for evote
//!
//! Layers, bottom-up:
//! ```text
//! permute   bit permutation / 28-bit rotation
//! des       key schedule + 16-round Feistel network (64-bit blocks)
//! modes     ECB, CBC, CBC with ciphertext stealing (CTS)
//! rsa       textbook RSA key pairs, raw encrypt/decrypt/sign/verify
//! vote      hybrid seal: DES-CTS for confidentiality, RSA over SHA-256 for authentication
//! record    hex/JSON interchange form of a sealed vote
//! ```
//!
//! None of this is constant-time; RSA is unpadded. Built for teaching
//! and interoperability tests, not for protecting real ballots.

pub mod des;
pub mod error;
pub mod keys;
pub mod modes;
pub mod permute;
pub mod record;
pub mod rsa;
pub mod vote;

pub use des::DesCipher;
pub use error::{CryptoError, CryptoResult, ErrorClass};
pub use keys::{generate_des_key, generate_iv, DesKey, Iv};
pub use modes::{cbc_decrypt, cbc_encrypt, cts_decrypt, cts_encrypt};
pub use record::SealedRecord;
pub use rsa::{KeyPair, PublicKey};
pub use vote::{seal, verify, SealedVote, SealingKeys, Verification};

/// DES block size in bytes (64-bit)
pub const BLOCK_SIZE: usize = 8;
