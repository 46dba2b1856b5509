//! Key management commands.
//!
//! `burnell keys generate` - Generate a new RSA keypair.
//! `burnell keys export` - Print an existing keypair as PEM or base64.

use super::resolve_keypair;
use crate::config::KeysConfig;
use burnell_jwt::RsaKeyPair;
use clap::ValueEnum;
use std::fs;
use std::path::PathBuf;

/// On-disk encoding for generated key files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileFormat {
    Pem,
    Der,
}

/// Printable encoding for exported keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Pem,
    Base64,
}

/// Generate a new RSA keypair.
pub fn generate(bits: usize, output: Option<PathBuf>, format: FileFormat) -> anyhow::Result<()> {
    tracing::info!(bits, "Generating RSA keypair");
    let keypair = RsaKeyPair::generate(bits)?;

    if let Some(output_dir) = output {
        // Create output directory if it doesn't exist
        fs::create_dir_all(&output_dir)?;

        let private_path = output_dir.join("private.key");
        let public_path = output_dir.join("public.key");

        match format {
            FileFormat::Pem => {
                keypair.write_private_key_pem(&private_path)?;
                keypair.write_public_key_pem(&public_path)?;
            }
            FileFormat::Der => {
                keypair.write_private_key_der(&private_path)?;
                keypair.write_public_key_der(&public_path)?;
            }
        }

        println!("✔ Generated {bits}-bit RSA keypair:");
        println!("  Private key: {}", private_path.display());
        println!("  Public key:  {}", public_path.display());
        println!();
        println!("⚠️  Keep your private key secure! Never commit it to version control.");
    } else {
        // Print to stdout
        println!("Private key (keep secure!):");
        print!("{}", keypair.private_key_pem());
        println!();
        println!("Public key:");
        print!("{}", keypair.public_key_pem());
        println!();
        println!("Base64 DER, for environment variables:");
        println!("  BURNELL_PRIVATE_KEY={}", keypair.private_key_base64());
        println!("  BURNELL_PUBLIC_KEY={}", keypair.public_key_base64());
        println!();
        println!("Use --output <dir> to save keys to files.");
    }

    Ok(())
}

/// Print an existing keypair in the requested encoding.
pub fn export(
    keys: &KeysConfig,
    private_key: Option<PathBuf>,
    public_key: Option<PathBuf>,
    format: ExportFormat,
) -> anyhow::Result<()> {
    let keypair = resolve_keypair(keys, private_key, public_key)?;
    print!("{}", render_export(&keypair, format));
    Ok(())
}

fn render_export(keypair: &RsaKeyPair, format: ExportFormat) -> String {
    match format {
        ExportFormat::Pem => format!("{}{}", keypair.private_key_pem(), keypair.public_key_pem()),
        ExportFormat::Base64 => format!(
            "{}\n{}\n",
            keypair.private_key_base64(),
            keypair.public_key_base64()
        ),
    }
}
