use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which protections a sealed vote carries.
///
/// The numeric values (1..=3) match the menu numbers used by the
/// interactive front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SealMode {
    /// DES encryption only (chained / ciphertext-stealing modes)
    Confidentiality,
    /// RSA signature over the SHA-256 digest of the plaintext
    Authentication,
    /// Encrypt, then sign the digest of the ciphertext
    #[default]
    Both,
}

impl SealMode {
    /// True when the mode produces a ciphertext.
    pub fn encrypts(self) -> bool {
        matches!(self, SealMode::Confidentiality | SealMode::Both)
    }

    /// True when the mode produces a signature.
    pub fn signs(self) -> bool {
        matches!(self, SealMode::Authentication | SealMode::Both)
    }

    pub fn as_u8(self) -> u8 {
        match self {
            SealMode::Confidentiality => 1,
            SealMode::Authentication => 2,
            SealMode::Both => 3,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SealMode::Confidentiality => "Confidentiality Only (Encryption)",
            SealMode::Authentication => "Authentication Only (Digital Signature)",
            SealMode::Both => "Both Confidentiality and Authentication",
        }
    }
}

impl TryFrom<u8> for SealMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SealMode::Confidentiality),
            2 => Ok(SealMode::Authentication),
            3 => Ok(SealMode::Both),
            other => Err(format!("seal mode must be 1-3, got {other}")),
        }
    }
}

impl fmt::Display for SealMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SealMode::Confidentiality => "confidentiality",
            SealMode::Authentication => "authentication",
            SealMode::Both => "both",
        };
        f.write_str(name)
    }
}

impl FromStr for SealMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confidentiality" | "encrypt" | "1" => Ok(SealMode::Confidentiality),
            "authentication" | "sign" | "2" => Ok(SealMode::Authentication),
            "both" | "3" => Ok(SealMode::Both),
            other => Err(format!(
                "unknown seal mode '{other}' (expected confidentiality, authentication, or both)"
            )),
        }
    }
}
