//! Key material lookup: command-line flag, then config, then (where allowed)
//! freshly generated keys.

use anyhow::{Context, Result};
use evote_core::config::{EvoteConfig, MIN_KEY_BITS};
use evote_crypto::rsa::{parse_decimal, KeyFile};
use evote_crypto::{generate_des_key, DesKey, KeyPair};
use num_bigint_dig::BigUint;
use rand::{CryptoRng, RngCore};
use std::path::Path;
use tracing::{debug, info};

pub fn read_key_file(path: &Path) -> Result<KeyPair> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading key file: {}", path.display()))?;
    let file =
        KeyFile::parse(&text).with_context(|| format!("parsing key file: {}", path.display()))?;
    file.into_key_pair()
        .with_context(|| format!("validating key file: {}", path.display()))
}

pub fn write_key_file(path: &Path, pair: &KeyPair) -> Result<()> {
    std::fs::write(path, KeyFile::from_key_pair(pair).render())
        .with_context(|| format!("writing key file: {}", path.display()))?;
    info!(path = %path.display(), bits = pair.modulus_bits(), "wrote key file");
    Ok(())
}

/// The DES key from `--des-key` or `des.key`, if either is set.
pub fn configured_des_key(config: &EvoteConfig, flag: Option<&str>) -> Result<Option<DesKey>> {
    flag.or(config.des.key.as_deref())
        .map(|hex| DesKey::from_hex(hex).context("parsing DES key"))
        .transpose()
}

pub fn des_key_or_generate<R: RngCore + CryptoRng + ?Sized>(
    config: &EvoteConfig,
    flag: Option<&str>,
    rng: &mut R,
) -> Result<DesKey> {
    match configured_des_key(config, flag)? {
        Some(key) => Ok(key),
        None => {
            debug!("no DES key configured, generating one");
            Ok(generate_des_key(rng))
        }
    }
}

/// The RSA key pair from `--key-file`, `rsa.key_file`, or `rsa.p`/`rsa.q`.
pub fn configured_key_pair(config: &EvoteConfig, flag: Option<&Path>) -> Result<Option<KeyPair>> {
    if let Some(path) = flag.or(config.rsa.key_file.as_deref()) {
        return read_key_file(path).map(Some);
    }
    match (&config.rsa.p, &config.rsa.q) {
        (Some(p), Some(q)) => KeyPair::from_decimal(p, q, &config.rsa.public_exponent)
            .context("building key pair from rsa.p / rsa.q")
            .map(Some),
        _ => Ok(None),
    }
}

pub fn public_exponent(config: &EvoteConfig) -> Result<BigUint> {
    parse_decimal(&config.rsa.public_exponent).context("parsing rsa.public_exponent")
}

/// Generate a key pair of `bits` (default `rsa.key_bits`) with the
/// configured exponent.
pub fn generate_key_pair<R: RngCore + CryptoRng + ?Sized>(
    config: &EvoteConfig,
    bits: Option<usize>,
    rng: &mut R,
) -> Result<KeyPair> {
    let bits = bits.unwrap_or(config.rsa.key_bits);
    if bits < MIN_KEY_BITS {
        anyhow::bail!("key size must be at least {MIN_KEY_BITS} bits, got {bits}");
    }
    info!(bits, "generating RSA key pair");
    KeyPair::generate(rng, bits, &public_exponent(config)?).context("generating RSA key pair")
}

pub fn key_pair_or_generate<R: RngCore + CryptoRng + ?Sized>(
    config: &EvoteConfig,
    flag: Option<&Path>,
    rng: &mut R,
) -> Result<KeyPair> {
    match configured_key_pair(config, flag)? {
        Some(pair) => Ok(pair),
        None => generate_key_pair(config, None, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_key_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rsa_keys.txt");
        let pair = KeyPair::from_decimal("61", "53", "17").unwrap();

        write_key_file(&path, &pair).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "p = 61\nq = 53\ne = 17\n"
        );
        let loaded = read_key_file(&path).unwrap();
        assert_eq!(loaded.d(), pair.d());
    }

    #[test]
    fn test_missing_key_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_key_file(&dir.path().join("absent.txt")).unwrap_err();
        assert!(err.to_string().contains("reading key file"));
    }

    #[test]
    fn test_flag_overrides_config_des_key() {
        let mut config = EvoteConfig::default();
        config.des.key = Some("0000000000000000".into());

        let key = configured_des_key(&config, Some("133457799bbcdff1"))
            .unwrap()
            .unwrap();
        assert_eq!(key.to_hex(), "133457799bbcdff1");

        let key = configured_des_key(&config, None).unwrap().unwrap();
        assert_eq!(key.to_hex(), "0000000000000000");
    }

    #[test]
    fn test_des_key_generated_when_unset() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = EvoteConfig::default();
        assert!(configured_des_key(&config, None).unwrap().is_none());
        des_key_or_generate(&config, None, &mut rng).unwrap();
    }

    #[test]
    fn test_key_pair_from_config_factors() {
        let mut config = EvoteConfig::default();
        config.rsa.p = Some("61".into());
        config.rsa.q = Some("53".into());
        config.rsa.public_exponent = "17".into();

        let pair = configured_key_pair(&config, None).unwrap().unwrap();
        assert_eq!(pair.n(), &BigUint::from(3233u32));
    }

    #[test]
    fn test_key_file_flag_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.txt");
        std::fs::write(&path, "p = 11\nq = 13\ne = 7\n").unwrap();

        let mut config = EvoteConfig::default();
        config.rsa.p = Some("61".into());
        config.rsa.q = Some("53".into());

        let pair = configured_key_pair(&config, Some(&path)).unwrap().unwrap();
        assert_eq!(pair.n(), &BigUint::from(143u32));
    }

    #[test]
    fn test_no_rsa_material() {
        assert!(configured_key_pair(&EvoteConfig::default(), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_generate_rejects_small_keys() {
        let mut rng = StdRng::seed_from_u64(6);
        let err = generate_key_pair(&EvoteConfig::default(), Some(512), &mut rng).unwrap_err();
        assert!(err.to_string().contains("at least 1024"));
    }
}
