use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EvoteError, EvoteResult};
use crate::types::SealMode;

/// Smallest RSA modulus the front end will generate.
pub const MIN_KEY_BITS: usize = 1024;

/// Top-level configuration (loaded from evote.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvoteConfig {
    pub vote: VoteConfig,
    pub rsa: RsaConfig,
    pub des: DesConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteConfig {
    /// Seal mode: "confidentiality", "authentication", or "both"
    pub mode: SealMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RsaConfig {
    /// Modulus size for generated keys (default: 1024)
    pub key_bits: usize,
    /// Public exponent, decimal (default: 65537)
    pub public_exponent: String,
    /// Caller-supplied prime factor p, decimal
    pub p: Option<String>,
    /// Caller-supplied prime factor q, decimal
    pub q: Option<String>,
    /// Key file with `p = ` / `q = ` / `e = ` lines
    pub key_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DesConfig {
    /// Fixed DES key as 16 hex characters (random when unset)
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for RsaConfig {
    fn default() -> Self {
        Self {
            key_bits: MIN_KEY_BITS,
            public_exponent: "65537".into(),
            p: None,
            q: None,
            key_file: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl EvoteConfig {
    /// Load from a TOML file, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> EvoteResult<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| EvoteError::Config(format!("parsing {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check field-level constraints that serde cannot express.
    pub fn validate(&self) -> EvoteResult<()> {
        if self.rsa.key_bits < MIN_KEY_BITS {
            return Err(EvoteError::Config(format!(
                "rsa.key_bits must be at least {MIN_KEY_BITS}, got {}",
                self.rsa.key_bits
            )));
        }
        if self.rsa.p.is_some() != self.rsa.q.is_some() {
            return Err(EvoteError::Config(
                "rsa.p and rsa.q must be supplied together".into(),
            ));
        }
        for (name, value) in [
            ("rsa.public_exponent", Some(&self.rsa.public_exponent)),
            ("rsa.p", self.rsa.p.as_ref()),
            ("rsa.q", self.rsa.q.as_ref()),
        ] {
            if let Some(v) = value {
                if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(EvoteError::Config(format!(
                        "{name} must be a decimal integer, got '{v}'"
                    )));
                }
            }
        }
        if let Some(key) = &self.des.key {
            if key.len() != 16 || hex::decode(key).is_err() {
                return Err(EvoteError::Config(format!(
                    "des.key must be 16 hex characters, got '{key}'"
                )));
            }
        }
        match self.log.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(EvoteError::Config(format!(
                "log.format must be 'json' or 'text', got '{other}'"
            ))),
        }
    }
}
