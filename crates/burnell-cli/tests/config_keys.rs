//! Tests for resolving key material from configuration files and the environment.
//!
//! Run with: cargo test --package burnell --test config_keys

use burnell::commands::{resolve_keypair, resolve_public_key};
use burnell::config::BurnellConfig;
use burnell_jwt::{RsaKeyPair, SigningAlgorithm, TokenIssuer, TokenVerifier, parse_expiry};
use std::fs;
use tempfile::tempdir;

/// Test that key file paths in a config file are used for issuing and verifying.
#[test]
fn test_keys_from_config_file() {
    let dir = tempdir().unwrap();
    let keypair = RsaKeyPair::generate(1024).unwrap();
    let private_path = dir.path().join("private.key");
    let public_path = dir.path().join("public.key");
    keypair.write_private_key_pem(&private_path).unwrap();
    keypair.write_public_key_pem(&public_path).unwrap();

    let config_path = dir.path().join("burnell.yaml");
    fs::write(
        &config_path,
        format!(
            "keys:\n  private_key_file: {}\n  public_key_file: {}\ntoken:\n  algorithm: rs512\n",
            private_path.display(),
            public_path.display()
        ),
    )
    .unwrap();

    let config = BurnellConfig::load(Some(config_path.as_path())).unwrap();
    assert_eq!(config.token.algorithm, SigningAlgorithm::RS512);

    let loaded = resolve_keypair(&config.keys, None, None).unwrap();
    assert_eq!(loaded.public_key_der(), keypair.public_key_der());

    let token = TokenIssuer::new(&loaded)
        .issue(
            "tenant-a",
            parse_expiry(&config.token.expiry).unwrap(),
            config.token.algorithm,
        )
        .unwrap();

    let public_key = resolve_public_key(&config.keys, None).unwrap();
    let verifier = TokenVerifier::from_public_key(public_key);
    assert!(verifier.verify_subject(&token, "tenant-a").unwrap());
}

/// Test that base64 DER keys are read from the configured environment variables.
#[test]
fn test_keys_from_environment() {
    let keypair = RsaKeyPair::generate(1024).unwrap();

    // SAFETY: We're in a test and controlling the environment
    unsafe {
        std::env::set_var("BURNELL_IT_PRIVATE_KEY", keypair.private_key_base64());
        std::env::set_var("BURNELL_IT_PUBLIC_KEY", keypair.public_key_base64());
    }

    let config = BurnellConfig::from_yaml(
        "keys:\n  private_key_env: BURNELL_IT_PRIVATE_KEY\n  public_key_env: BURNELL_IT_PUBLIC_KEY\n",
    )
    .unwrap();

    let loaded = resolve_keypair(&config.keys, None, None).unwrap();
    assert_eq!(loaded.private_key_der(), keypair.private_key_der());

    let public_key = resolve_public_key(&config.keys, None).unwrap();
    assert_eq!(&public_key, keypair.public_key());

    // SAFETY: Cleanup in test
    unsafe {
        std::env::remove_var("BURNELL_IT_PRIVATE_KEY");
        std::env::remove_var("BURNELL_IT_PUBLIC_KEY");
    }
}

/// Test that a missing config file is an error, not silently defaulted.
#[test]
fn test_missing_config_file() {
    let dir = tempdir().unwrap();
    assert!(BurnellConfig::load(Some(dir.path().join("absent.yaml").as_path())).is_err());
}
