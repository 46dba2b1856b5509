//! Token management commands.
//!
//! `burnell token create` - Issue a token for a subject.
//! `burnell token verify` - Verify a token and report its subject.
//! `burnell token inspect` - Decode a token without verifying it.

use super::{read_token_arg, resolve_keypair, resolve_public_key};
use crate::config::BurnellConfig;
use anyhow::Context;
use burnell_jwt::{TokenIssuer, TokenVerifier, inspect_token_unverified, resolve_claims};
use std::fs;
use std::path::PathBuf;

/// Options for `burnell token create`.
#[derive(Debug, Default)]
pub struct CreateOptions {
    pub subject: String,
    pub expiry: Option<String>,
    pub algorithm: Option<String>,
    pub private_key: Option<PathBuf>,
    pub public_key: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Issue a token and print it or write it to a file.
pub fn create(config: &BurnellConfig, options: CreateOptions) -> anyhow::Result<()> {
    let token = issue_token(config, &options)?;

    if let Some(output_path) = &options.output {
        fs::write(output_path, &token)?;
        println!("✔ Token written to: {}", output_path.display());
        println!("  Subject: {}", options.subject);
    } else {
        println!("{token}");
    }

    Ok(())
}

fn issue_token(config: &BurnellConfig, options: &CreateOptions) -> anyhow::Result<String> {
    let expiry = options
        .expiry
        .as_deref()
        .unwrap_or(&config.token.expiry);
    let algorithm = options
        .algorithm
        .clone()
        .unwrap_or_else(|| config.token.algorithm.to_string());

    let (duration, algorithm) =
        resolve_claims(expiry, &algorithm).context("Invalid token settings")?;

    let keypair = resolve_keypair(
        &config.keys,
        options.private_key.clone(),
        options.public_key.clone(),
    )?;

    TokenIssuer::new(&keypair)
        .issue(&options.subject, duration, algorithm)
        .with_context(|| format!("Failed to issue token for {}", options.subject))
}

/// Verify a token, optionally requiring a subject.
pub fn verify(
    config: &BurnellConfig,
    public_key: Option<PathBuf>,
    token: String,
    subject: Option<String>,
) -> anyhow::Result<()> {
    let report = verification_report(config, public_key, token, subject)?;
    println!("✔ Token is valid");
    println!();
    println!("Token Details:");
    println!("  Subject: {}", report.subject);
    match report.expires_at {
        Some(exp) => println!("  Expires at: {exp} (unix)"),
        None => println!("  Expires at: never"),
    }
    println!("  Remaining validity: {}s", report.remaining_validity);
    Ok(())
}

struct VerificationReport {
    subject: String,
    expires_at: Option<i64>,
    remaining_validity: i64,
}

fn verification_report(
    config: &BurnellConfig,
    public_key: Option<PathBuf>,
    token: String,
    subject: Option<String>,
) -> anyhow::Result<VerificationReport> {
    let public_key = resolve_public_key(&config.keys, public_key)?;
    let verifier = TokenVerifier::from_public_key(public_key);
    let token = read_token_arg(token)?;

    if let Some(expected) = &subject {
        verifier
            .verify_subject(&token, expected)
            .context("Token verification failed")?;
    }

    let claims = verifier
        .verify(&token)
        .context("Token verification failed")?;
    let subject = claims
        .subject()
        .context("Token verification failed")?
        .to_string();

    Ok(VerificationReport {
        subject,
        expires_at: claims.exp,
        remaining_validity: claims.remaining_validity(),
    })
}

/// Inspect a token without verification.
pub fn inspect(token: String) -> anyhow::Result<()> {
    let token = read_token_arg(token)?;
    let info = inspect_token_unverified(&token)?;

    println!("Header:");
    println!("{}", serde_json::to_string_pretty(&info.header)?);
    println!();
    println!("Claims:");
    println!("{}", serde_json::to_string_pretty(&info.payload)?);

    Ok(())
}
