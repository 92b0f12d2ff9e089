//! evote: seal and verify ballots with classical DES and RSA
//!
//! Commands:
//!   seal <ballot>               - seal a ballot, print the record, verify it
//!   verify <record.json>        - verify a record written by `seal --out`
//!   keygen                      - generate an RSA key pair and write a key file
//!   encrypt / decrypt           - DES-CBC with ciphertext stealing on raw input
//!   bulk <file>                 - ECB vs CBC side by side over a file
//!   attack                      - unpadded-RSA attack demonstrations
//!   sqmul <b> <e> <m>           - word-sized square-and-multiply
//!   config show                 - display current configuration

mod material;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use num_bigint_dig::BigUint;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use evote_core::config::EvoteConfig;
use evote_core::SealMode;
use evote_crypto::modes::{cbc_encrypt_bulk, ecb_encrypt};
use evote_crypto::rsa::attacks::{malleate, message_magnitude, recover_from_dictionary};
use evote_crypto::rsa::{square_and_multiply, DEFAULT_PUBLIC_EXPONENT};
use evote_crypto::{
    cbc_decrypt, cts_decrypt, cts_encrypt, generate_iv, seal, verify, DesCipher, Iv, KeyPair,
    SealedRecord, SealedVote, SealingKeys, Verification, BLOCK_SIZE,
};

/// Ballots the dictionary attack tries.
const CANDIDATES: [&str; 10] = [
    "Alice", "Bob", "Charlie", "Dave", "Eve", "Frank", "Grace", "Heidi", "Ivan", "Judy",
];

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "evote",
    version,
    about = "Classical-crypto vote sealing",
    long_about = "evote: seal ballots with DES (CBC / ciphertext stealing) and textbook RSA signatures"
)]
struct Cli {
    /// Path to evote.toml configuration file
    #[arg(long, short = 'c', env = "EVOTE_CONFIG", default_value = "evote.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides log.level
    #[arg(long, env = "EVOTE_LOG")]
    log: Option<String>,

    /// Log format (json, text); overrides log.format
    #[arg(long, env = "EVOTE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seal a ballot and immediately verify the result
    Seal {
        /// The ballot (candidate name)
        ballot: String,
        /// Seal mode: confidentiality, authentication, both (or 1-3)
        #[arg(long, short = 'm')]
        mode: Option<SealMode>,
        /// DES key as 16 hex characters (random when unset)
        #[arg(long, env = "EVOTE_DES_KEY")]
        des_key: Option<String>,
        /// IV as 16 hex characters (random when unset)
        #[arg(long)]
        iv: Option<String>,
        /// RSA key file (p / q / e lines); a key is generated when unset
        #[arg(long, env = "EVOTE_KEY_FILE")]
        key_file: Option<PathBuf>,
        /// Write the sealed record as JSON
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// Write a generated RSA key pair to this key file
        #[arg(long)]
        save_key: Option<PathBuf>,
    },

    /// Verify a sealed record written by `seal --out`
    Verify {
        /// JSON record
        record: PathBuf,
        /// Claimed ballot; required for authentication-only records
        #[arg(long)]
        message: Option<String>,
        #[arg(long, env = "EVOTE_DES_KEY")]
        des_key: Option<String>,
        #[arg(long, env = "EVOTE_KEY_FILE")]
        key_file: Option<PathBuf>,
    },

    /// Generate an RSA key pair and write it as a key file
    Keygen {
        /// Modulus size in bits (default: rsa.key_bits)
        #[arg(long, short = 'b')]
        bits: Option<usize>,
        /// Output key file
        #[arg(long, short = 'o', default_value = "rsa_keys.txt")]
        out: PathBuf,
    },

    /// DES-CBC with ciphertext stealing; output has the input's length
    Encrypt {
        /// Plaintext (at least 8 bytes)
        input: String,
        /// Treat the input as hex instead of text
        #[arg(long)]
        hex: bool,
        #[arg(long, env = "EVOTE_DES_KEY")]
        des_key: Option<String>,
        #[arg(long)]
        iv: Option<String>,
    },

    /// Invert `encrypt`
    Decrypt {
        /// Ciphertext as hex
        input: String,
        #[arg(long, env = "EVOTE_DES_KEY")]
        des_key: Option<String>,
        #[arg(long)]
        iv: String,
    },

    /// Encrypt a file with ECB and CBC side by side
    Bulk {
        input: PathBuf,
        /// Directory for <stem>_ecb / <stem>_cbc outputs (default: input's directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Leading bytes copied through unencrypted (54 for an uncompressed bitmap)
        #[arg(long, default_value_t = 0)]
        header_bytes: usize,
        #[arg(long, env = "EVOTE_DES_KEY")]
        des_key: Option<String>,
        #[arg(long)]
        iv: Option<String>,
    },

    /// Demonstrate attacks on unpadded RSA
    Attack {
        /// Modulus size of the throwaway key
        #[arg(long, short = 'b', default_value_t = 512)]
        bits: usize,
        /// Ballot the victim encrypts
        #[arg(long, default_value = "Charlie")]
        ballot: String,
    },

    /// base^exponent mod modulus over 64-bit words
    Sqmul {
        base: u64,
        exponent: u64,
        modulus: u64,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let config = if config_found {
        EvoteConfig::load(&cli.config)
            .with_context(|| format!("loading config: {}", cli.config.display()))?
    } else {
        EvoteConfig::default()
    };

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.unwrap_or(match config.log.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(&level, format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "evote starting"
    );
    if !config_found {
        warn!("config file not found: {}  (using defaults)", cli.config.display());
    }

    // one CSPRNG for the whole process
    let mut rng = StdRng::from_entropy();

    match cli.command {
        Commands::Seal {
            ballot,
            mode,
            des_key,
            iv,
            key_file,
            out,
            save_key,
        } => cmd_seal(
            &config,
            &mut rng,
            SealArgs {
                ballot: &ballot,
                mode: mode.unwrap_or(config.vote.mode),
                des_key: des_key.as_deref(),
                iv: iv.as_deref(),
                key_file: key_file.as_deref(),
                out: out.as_deref(),
                save_key: save_key.as_deref(),
            },
        ),
        Commands::Verify {
            record,
            message,
            des_key,
            key_file,
        } => cmd_verify(
            &config,
            &record,
            message.as_deref(),
            des_key.as_deref(),
            key_file.as_deref(),
        ),
        Commands::Keygen { bits, out } => cmd_keygen(&config, &mut rng, bits, &out),
        Commands::Encrypt {
            input,
            hex,
            des_key,
            iv,
        } => cmd_encrypt(&config, &mut rng, &input, hex, des_key.as_deref(), iv.as_deref()),
        Commands::Decrypt { input, des_key, iv } => {
            cmd_decrypt(&config, &input, des_key.as_deref(), &iv)
        }
        Commands::Bulk {
            input,
            out_dir,
            header_bytes,
            des_key,
            iv,
        } => cmd_bulk(
            &config,
            &mut rng,
            &input,
            out_dir.as_deref(),
            header_bytes,
            des_key.as_deref(),
            iv.as_deref(),
        ),
        Commands::Attack { bits, ballot } => cmd_attack(&mut rng, bits, &ballot),
        Commands::Sqmul {
            base,
            exponent,
            modulus,
        } => cmd_sqmul(base, exponent, modulus),
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn iv_or_generate(flag: Option<&str>, rng: &mut StdRng) -> Result<Iv> {
    match flag {
        Some(hex) => Iv::from_hex(hex).context("parsing IV"),
        None => Ok(generate_iv(rng)),
    }
}

// ── `evote seal` ──────────────────────────────────────────────────────────────

struct SealArgs<'a> {
    ballot: &'a str,
    mode: SealMode,
    des_key: Option<&'a str>,
    iv: Option<&'a str>,
    key_file: Option<&'a Path>,
    out: Option<&'a Path>,
    save_key: Option<&'a Path>,
}

fn cmd_seal(config: &EvoteConfig, rng: &mut StdRng, args: SealArgs<'_>) -> Result<()> {
    let mode = args.mode;
    let iv = iv_or_generate(args.iv, rng)?;

    let des = if mode.encrypts() {
        Some(material::des_key_or_generate(config, args.des_key, rng)?)
    } else {
        None
    };
    let rsa = if mode.signs() {
        let pair = material::key_pair_or_generate(config, args.key_file, rng)?;
        if let Some(path) = args.save_key {
            material::write_key_file(path, &pair)?;
        }
        Some(pair)
    } else {
        None
    };
    let keys = SealingKeys { des, rsa };

    println!("Vote");
    println!("  mode:      {} ({})", mode.description(), mode.as_u8());
    println!("  ballot:    {}", args.ballot);
    if let Some(key) = &keys.des {
        println!("  DES key:   {}", key.to_hex());
    }
    println!("  IV:        {}", iv.to_hex());
    if let Some(pair) = &keys.rsa {
        println!("  RSA n:     {} bits", pair.modulus_bits());
        println!("  RSA e:     {}", pair.e());
    }
    println!();

    let sealed = seal(mode, args.ballot.as_bytes(), &keys, iv).context("sealing vote")?;
    print_sealed(&sealed);

    if let Some(path) = args.out {
        let json = serde_json::to_string_pretty(&SealedRecord::from(&sealed))
            .context("serializing sealed record")?;
        std::fs::write(path, json + "\n")
            .with_context(|| format!("writing record: {}", path.display()))?;
        println!("  written:   {}", path.display());
    }
    println!();

    let outcome =
        verify(&sealed, &keys, Some(args.ballot.as_bytes())).context("verifying vote")?;
    report(&outcome)
}

fn print_sealed(sealed: &SealedVote) {
    println!("Sealed vote");
    println!("  mode:      {}", sealed.mode());
    println!("  IV:        {}", sealed.iv().to_hex());
    if let Some(ct) = sealed.ciphertext() {
        println!("  ciphertext ({} bytes): {}", ct.len(), hex::encode(ct));
    }
    if let Some(sig) = sealed.signature() {
        println!("  signature: {}", sig.to_str_radix(16));
    }
}

fn report(outcome: &Verification) -> Result<()> {
    match outcome {
        Verification::Verified { message } => {
            println!("Verified");
            println!("  ballot:    {}", String::from_utf8_lossy(message));
            Ok(())
        }
        Verification::SignatureMismatch => anyhow::bail!("signature verification failed"),
    }
}

// ── `evote verify` ────────────────────────────────────────────────────────────

fn cmd_verify(
    config: &EvoteConfig,
    record_path: &Path,
    message: Option<&str>,
    des_key: Option<&str>,
    key_file: Option<&Path>,
) -> Result<()> {
    let content = std::fs::read_to_string(record_path)
        .with_context(|| format!("reading record: {}", record_path.display()))?;
    let record: SealedRecord = serde_json::from_str(&content)
        .with_context(|| format!("parsing record: {}", record_path.display()))?;
    let sealed = SealedVote::try_from(record).context("decoding record")?;

    let des = if sealed.mode().encrypts() {
        Some(material::configured_des_key(config, des_key)?.context(
            "record is encrypted; supply --des-key or set des.key in config",
        )?)
    } else {
        None
    };
    let rsa = if sealed.mode().signs() {
        Some(material::configured_key_pair(config, key_file)?.context(
            "record is signed; supply --key-file or set rsa.key_file / rsa.p / rsa.q",
        )?)
    } else {
        None
    };

    print_sealed(&sealed);
    println!();

    let outcome = verify(
        &sealed,
        &SealingKeys { des, rsa },
        message.map(str::as_bytes),
    )
    .context("verifying record")?;
    report(&outcome)
}

// ── `evote keygen` ────────────────────────────────────────────────────────────

fn cmd_keygen(
    config: &EvoteConfig,
    rng: &mut StdRng,
    bits: Option<usize>,
    out: &Path,
) -> Result<()> {
    let pair = material::generate_key_pair(config, bits, rng)?;
    material::write_key_file(out, &pair)?;
    println!("Generated {}-bit key pair", pair.modulus_bits());
    println!("  e:         {}", pair.e());
    println!("  key file:  {}", out.display());
    Ok(())
}

// ── `evote encrypt` / `evote decrypt` ─────────────────────────────────────────

fn cmd_encrypt(
    config: &EvoteConfig,
    rng: &mut StdRng,
    input: &str,
    is_hex: bool,
    des_key: Option<&str>,
    iv: Option<&str>,
) -> Result<()> {
    let data = if is_hex {
        hex::decode(input.trim()).context("decoding hex input")?
    } else {
        input.as_bytes().to_vec()
    };
    let key = material::des_key_or_generate(config, des_key, rng)?;
    let iv = iv_or_generate(iv, rng)?;

    let ct = cts_encrypt(&DesCipher::new(&key), &iv, &data).context("encrypting")?;
    println!("key:        {}", key.to_hex());
    println!("iv:         {}", iv.to_hex());
    println!("ciphertext: {}", hex::encode(&ct));
    Ok(())
}

fn cmd_decrypt(config: &EvoteConfig, input: &str, des_key: Option<&str>, iv: &str) -> Result<()> {
    let data = hex::decode(input.trim()).context("decoding hex ciphertext")?;
    let key = material::configured_des_key(config, des_key)?
        .context("supply --des-key or set des.key in config")?;
    let iv = Iv::from_hex(iv).context("parsing IV")?;
    let cipher = DesCipher::new(&key);

    let plain = if data.len() % BLOCK_SIZE == 0 {
        cbc_decrypt(&cipher, &iv, &data)
    } else {
        cts_decrypt(&cipher, &iv, &data)
    }
    .context("decrypting")?;

    println!("plaintext:  {}", String::from_utf8_lossy(&plain));
    println!("hex:        {}", hex::encode(&plain));
    Ok(())
}

// ── `evote bulk` ──────────────────────────────────────────────────────────────

fn cmd_bulk(
    config: &EvoteConfig,
    rng: &mut StdRng,
    input: &Path,
    out_dir: Option<&Path>,
    header_bytes: usize,
    des_key: Option<&str>,
    iv: Option<&str>,
) -> Result<()> {
    let data =
        std::fs::read(input).with_context(|| format!("reading input: {}", input.display()))?;
    if header_bytes > data.len() {
        anyhow::bail!(
            "header of {header_bytes} bytes exceeds the {}-byte input",
            data.len()
        );
    }
    let (header, body) = data.split_at(header_bytes);

    let key = material::des_key_or_generate(config, des_key, rng)?;
    let iv = iv_or_generate(iv, rng)?;
    let cipher = DesCipher::new(&key);

    // outputs keep the input length so the file stays viewable
    let mut ecb_body = ecb_encrypt(&cipher, body).context("ECB encryption")?;
    ecb_body.truncate(body.len());
    let cbc_body = cbc_encrypt_bulk(&cipher, &iv, body).context("CBC encryption")?;

    let dir = out_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bulk".to_string());
    let ext = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    println!("key:  {}", key.to_hex());
    println!("iv:   {}", iv.to_hex());
    for (label, encrypted) in [("ecb", ecb_body), ("cbc", cbc_body)] {
        let path = dir.join(format!("{stem}_{label}{ext}"));
        let mut out = Vec::with_capacity(data.len());
        out.extend_from_slice(header);
        out.extend_from_slice(&encrypted);
        std::fs::write(&path, &out)
            .with_context(|| format!("writing output: {}", path.display()))?;
        info!(mode = label, bytes = encrypted.len(), path = %path.display(), "bulk output");
        println!("{label}:  {}", path.display());
    }
    Ok(())
}

// ── `evote attack` ────────────────────────────────────────────────────────────

fn cmd_attack(rng: &mut StdRng, bits: usize, ballot: &str) -> Result<()> {
    let e = BigUint::from(DEFAULT_PUBLIC_EXPONENT);
    let pair = KeyPair::generate_with(rng, bits / 2, bits - bits / 2, &e)
        .context("generating demonstration key")?;
    let pk = pair.public_key();
    println!("Throwaway {}-bit key, e = {}", pk.modulus_bits(), pk.e);
    println!();

    let c = pk.encrypt(ballot.as_bytes()).context("encrypting ballot")?;

    println!("1. Short messages are tiny next to n");
    for candidate in CANDIDATES {
        let mag = message_magnitude(candidate.as_bytes());
        println!("   {candidate:<8} {:>3} bits  (n has {})", mag.bits, pk.modulus_bits());
    }
    println!();

    println!("2. Encryption is deterministic: try every candidate");
    match recover_from_dictionary(&pk, &c, CANDIDATES) {
        Some(found) => println!("   ciphertext decodes to '{found}' without the private key"),
        None => println!("   '{ballot}' is not in the candidate list; no match"),
    }
    println!();

    println!("3. Encryption is multiplicative: c * 2^e decrypts to 2m");
    let two = BigUint::from(2u32);
    let forged = malleate(&pk, &c, &two).context("malleating ciphertext")?;
    let m = message_magnitude(ballot.as_bytes()).value;
    let recovered = pair.decrypt_uint(&forged).context("decrypting forged ciphertext")?;
    println!("   m        = {m}");
    println!("   D(c*2^e) = {recovered}");
    println!("   2m mod n = {}", (&m * &two) % &pk.n);
    Ok(())
}

// ── `evote sqmul` ─────────────────────────────────────────────────────────────

fn cmd_sqmul(base: u64, exponent: u64, modulus: u64) -> Result<()> {
    let result = square_and_multiply(base, exponent, modulus).context("square-and-multiply")?;
    println!("{base}^{exponent} mod {modulus} = {result}");
    Ok(())
}

// ── `evote config show` ───────────────────────────────────────────────────────

fn cmd_config_show(config: &EvoteConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_seal() {
        let cli = Cli::try_parse_from([
            "evote",
            "seal",
            "Bob",
            "--mode",
            "confidentiality",
            "--des-key",
            "133457799bbcdff1",
        ])
        .unwrap();
        match cli.command {
            Commands::Seal { ballot, mode, .. } => {
                assert_eq!(ballot, "Bob");
                assert_eq!(mode, Some(SealMode::Confidentiality));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["evote", "seal", "Bob", "--mode", "secret"]).is_err());
    }

    #[test]
    fn test_cli_parses_sqmul() {
        let cli = Cli::try_parse_from(["evote", "sqmul", "5", "13", "23"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sqmul {
                base: 5,
                exponent: 13,
                modulus: 23
            }
        ));
    }

    #[test]
    fn test_bulk_writes_both_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("image.bmp");
        let mut data = vec![0x42u8; 54];
        data.extend(std::iter::repeat(0xFFu8).take(67));
        std::fs::write(&input, &data).unwrap();

        let mut rng = StdRng::seed_from_u64(9);
        cmd_bulk(
            &EvoteConfig::default(),
            &mut rng,
            &input,
            None,
            54,
            Some("133457799bbcdff1"),
            Some("0001020304050607"),
        )
        .unwrap();

        let ecb = std::fs::read(dir.path().join("image_ecb.bmp")).unwrap();
        let cbc = std::fs::read(dir.path().join("image_cbc.bmp")).unwrap();
        assert_eq!(ecb.len(), data.len());
        assert_eq!(cbc.len(), data.len());
        assert_eq!(&ecb[..54], &data[..54], "header must pass through");
        assert_eq!(&ecb[54..62], &ecb[62..70], "ECB repeats identical blocks");
        assert_ne!(&cbc[54..62], &cbc[62..70]);
        assert_eq!(&cbc[118..], &data[118..], "CBC tail passes through");
    }

    #[test]
    fn test_bulk_rejects_oversized_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("small.bin");
        std::fs::write(&input, [0u8; 10]).unwrap();

        let mut rng = StdRng::seed_from_u64(10);
        assert!(cmd_bulk(
            &EvoteConfig::default(),
            &mut rng,
            &input,
            None,
            54,
            None,
            None
        )
        .is_err());
    }

    #[test]
    fn test_seal_writes_verifiable_record() {
        let dir = tempfile::tempdir().unwrap();
        let record = dir.path().join("vote.json");
        let mut config = EvoteConfig::default();
        config.rsa.p = Some("1393796574908163946345982392040522594123813".into());
        config.rsa.q = Some("2787593149816327892691964784081045188247557".into());
        config.des.key = Some("133457799bbcdff1".into());

        let mut rng = StdRng::seed_from_u64(12);
        cmd_seal(
            &config,
            &mut rng,
            SealArgs {
                ballot: "Heidi",
                mode: SealMode::Both,
                des_key: None,
                iv: None,
                key_file: None,
                out: Some(&record),
                save_key: None,
            },
        )
        .unwrap();

        cmd_verify(&config, &record, None, None, None).unwrap();
    }
}
