//! CLI command implementations for Burnell.

pub mod keys;
pub mod token;

use crate::config::KeysConfig;
use anyhow::Context;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use burnell_jwt::{RsaKeyPair, RsaPublicKey, codec};
use std::path::{Path, PathBuf};

/// Resolve the full keypair.
///
/// Explicit paths win, then the configured key files, then the configured
/// environment variables (base64 DER).
pub fn resolve_keypair(
    keys: &KeysConfig,
    private_key: Option<PathBuf>,
    public_key: Option<PathBuf>,
) -> anyhow::Result<RsaKeyPair> {
    let private_path = private_key.or_else(|| keys.private_key_file.clone());
    let public_path = public_key.or_else(|| keys.public_key_file.clone());

    if let (Some(private_path), Some(public_path)) = (&private_path, &public_path) {
        return RsaKeyPair::load_from_files(private_path, public_path).with_context(|| {
            format!(
                "Failed to load keypair from {} and {}",
                private_path.display(),
                public_path.display()
            )
        });
    }

    match (keys.private_key_from_env(), keys.public_key_from_env()) {
        (Some(private_b64), Some(public_b64)) => {
            RsaKeyPair::load_from_encoded_bytes(private_b64.trim(), public_b64.trim())
                .context("Failed to parse keypair from environment. Expected base64 DER")
        }
        _ => anyhow::bail!(
            "Keypair not provided. Either pass --private-key <path> --public-key <path> \
             or configure keys in burnell.yaml"
        ),
    }
}

/// Resolve only the public key, for verification.
pub fn resolve_public_key(
    keys: &KeysConfig,
    public_key: Option<PathBuf>,
) -> anyhow::Result<RsaPublicKey> {
    if let Some(path) = public_key.or_else(|| keys.public_key_file.clone()) {
        let der = codec::read_key_file(&path)
            .with_context(|| format!("Failed to read public key from {}", path.display()))?;
        return codec::parse_public_key_der(&der)
            .with_context(|| format!("Failed to parse public key from {}", path.display()));
    }

    let encoded = keys.public_key_from_env().context(
        "Public key not provided. Either pass --public-key <path> or configure keys in burnell.yaml",
    )?;
    let der = STANDARD
        .decode(encoded.trim())
        .context("Public key in environment is not valid base64")?;
    codec::parse_public_key_der(&der).context("Failed to parse public key from environment")
}

/// Accept either a token or a path to a file holding one.
pub fn read_token_arg(token: String) -> anyhow::Result<String> {
    let path = Path::new(&token);
    if path.is_file() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read token from {}", path.display()))?;
        return Ok(content.trim().to_string());
    }
    Ok(token.trim().to_string())
}
