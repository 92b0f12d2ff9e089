//! End-to-end seal/verify scenarios across all three modes.

use evote_core::SealMode;
use evote_crypto::rsa::DEFAULT_PUBLIC_EXPONENT;
use evote_crypto::{
    generate_des_key, generate_iv, seal, verify, CryptoError, KeyPair, SealedRecord, SealedVote,
    SealingKeys, Verification,
};
use num_bigint_dig::BigUint;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// 512-bit modulus: large enough to sign a SHA-256 digest, quick to generate.
fn sealing_keys(seed: u64) -> SealingKeys {
    let mut rng = StdRng::seed_from_u64(seed);
    let rsa = KeyPair::generate_with(&mut rng, 256, 256, &BigUint::from(DEFAULT_PUBLIC_EXPONENT))
        .expect("key generation");
    SealingKeys {
        des: Some(generate_des_key(&mut rng)),
        rsa: Some(rsa),
    }
}

fn verified(message: &[u8]) -> Verification {
    Verification::Verified {
        message: message.to_vec(),
    }
}

#[test]
fn short_ballot_both_modes() {
    let keys = sealing_keys(100);
    let iv = generate_iv(&mut StdRng::seed_from_u64(101));

    let sealed = seal(SealMode::Both, b"Bob", &keys, iv).unwrap();
    assert_eq!(sealed.mode(), SealMode::Both);
    assert_eq!(sealed.ciphertext().map(<[u8]>::len), Some(8));
    assert!(sealed.signature().is_some());

    assert_eq!(verify(&sealed, &keys, None).unwrap(), verified(b"Bob"));
}

#[test]
fn eleven_bytes_confidentiality_uses_stealing() {
    let keys = sealing_keys(102);
    let iv = generate_iv(&mut StdRng::seed_from_u64(103));

    let sealed = seal(SealMode::Confidentiality, b"Hello World", &keys, iv).unwrap();
    // stealing keeps the length; padding would have produced 16 bytes
    assert_eq!(sealed.ciphertext().map(<[u8]>::len), Some(11));
    assert!(sealed.signature().is_none());

    assert_eq!(verify(&sealed, &keys, None).unwrap(), verified(b"Hello World"));
}

#[test]
fn authentication_only_checks_claimed_ballot() {
    let keys = sealing_keys(104);
    let sealed = seal(SealMode::Authentication, b"Alice", &keys, Default::default()).unwrap();
    assert!(sealed.ciphertext().is_none());

    assert_eq!(
        verify(&sealed, &keys, Some(&b"Alice"[..])).unwrap(),
        verified(b"Alice")
    );
    assert_eq!(
        verify(&sealed, &keys, Some(&b"Mallory"[..])).unwrap(),
        Verification::SignatureMismatch
    );
}

#[test]
fn tampered_ciphertext_fails_before_decryption() {
    let keys = sealing_keys(105);
    let sealed = seal(SealMode::Both, b"Charlie for mayor", &keys, Default::default()).unwrap();

    let (mode, iv, ciphertext, signature) = sealed.into_parts();
    let mut ciphertext = ciphertext.unwrap();
    ciphertext[0] ^= 0x01;
    let tampered = SealedVote::from_parts(mode, iv, Some(ciphertext), signature);

    assert_eq!(
        verify(&tampered, &keys, None).unwrap(),
        Verification::SignatureMismatch
    );
}

#[test]
fn forged_signature_rejected() {
    let keys = sealing_keys(106);
    let other = sealing_keys(107);
    let forged = seal(SealMode::Both, b"Dave", &other, Default::default()).unwrap();

    // same DES key, different signer
    let keys = SealingKeys {
        des: other.des.clone(),
        rsa: keys.rsa,
    };
    assert!(!verify(&forged, &keys, None).unwrap().is_verified());
}

#[test]
fn wrong_des_key_garbles_confidential_ballot() {
    let keys = sealing_keys(108);
    let sealed = seal(
        SealMode::Confidentiality,
        b"Eve and Frank",
        &keys,
        Default::default(),
    )
    .unwrap();

    let wrong = sealing_keys(109);
    match verify(&sealed, &wrong, None).unwrap() {
        Verification::Verified { message } => assert_ne!(message, b"Eve and Frank"),
        Verification::SignatureMismatch => panic!("confidentiality mode carries no signature"),
    }
}

#[test]
fn record_interchange_preserves_verification() {
    let keys = sealing_keys(110);
    let sealed = seal(SealMode::Both, b"Grace Hopper", &keys, Default::default()).unwrap();

    let json = serde_json::to_string_pretty(&SealedRecord::from(&sealed)).unwrap();
    let record: SealedRecord = serde_json::from_str(&json).unwrap();
    let restored = SealedVote::try_from(record).unwrap();

    assert_eq!(restored, sealed);
    assert_eq!(
        verify(&restored, &keys, None).unwrap(),
        verified(b"Grace Hopper")
    );
}

#[test]
fn seal_rejects_empty_ballot() {
    let keys = sealing_keys(111);
    let err = seal(SealMode::Both, b"", &keys, Default::default()).unwrap_err();
    assert!(matches!(err, CryptoError::EmptyMessage));
}

#[test]
fn keygen_rejects_bad_exponents() {
    // phi(61 * 53) = 3120
    for (e, expected) in [
        ("1", "must satisfy 1 < e < phi(n)"),
        ("3120", "must satisfy 1 < e < phi(n)"),
        ("3121", "must satisfy 1 < e < phi(n)"),
        ("6", "must be coprime"),
        ("65", "must be coprime"),
    ] {
        let err = KeyPair::from_decimal("61", "53", e).unwrap_err();
        assert!(err.to_string().contains(expected), "e = {e}: {err}");
    }
}
