//! RSA keypair management.

use crate::codec;
use crate::error::{JwtError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use pem::{EncodeConfig, LineEnding, Pem};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Key size used when the caller has no preference.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Smallest modulus accepted for generated keys.
pub const MIN_KEY_BITS: usize = 512;

/// An RSA keypair together with its canonical DER encodings.
///
/// The DER bytes are always derived from the key objects when the pair is
/// built, so the two views cannot drift apart.
#[derive(Clone)]
pub struct RsaKeyPair {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
    private_key_pkcs8: Vec<u8>,
    public_key_pkix: Vec<u8>,
}

impl RsaKeyPair {
    /// Generate a new random keypair with a modulus of `bits` bits.
    pub fn generate(bits: usize) -> Result<Self> {
        if bits < MIN_KEY_BITS {
            return Err(JwtError::Generation(format!(
                "{bits}-bit keys are too small, minimum is {MIN_KEY_BITS}"
            )));
        }

        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| JwtError::Generation(e.to_string()))?;
        private_key
            .validate()
            .map_err(|e| JwtError::Generation(e.to_string()))?;

        tracing::debug!(bits, "Generated RSA keypair");

        let public_key = private_key.to_public_key();
        Self::from_keys(private_key, public_key)
    }

    /// Generate a new random keypair with [`DEFAULT_KEY_BITS`].
    pub fn generate_default() -> Result<Self> {
        Self::generate(DEFAULT_KEY_BITS)
    }

    /// Build a keypair from parsed key objects.
    pub fn from_keys(private_key: RsaPrivateKey, public_key: RsaPublicKey) -> Result<Self> {
        let private_key_pkcs8 = private_key
            .to_pkcs8_der()
            .map_err(|e| JwtError::Parse(format!("PKCS8 encoding: {e}")))?
            .as_bytes()
            .to_vec();
        let public_key_pkix = public_key
            .to_public_key_der()
            .map_err(|e| JwtError::Parse(format!("PKIX encoding: {e}")))?
            .into_vec();

        Ok(Self {
            private_key,
            public_key,
            private_key_pkcs8,
            public_key_pkix,
        })
    }

    /// Load a keypair from two key files.
    ///
    /// Each file may be PEM, DER or PKCS12; the format is detected from its
    /// first bytes. PKCS12 bundles are not unpacked, so only files that
    /// actually hold PKCS8/PKIX DER will parse.
    pub fn load_from_files(private_key_path: &Path, public_key_path: &Path) -> Result<Self> {
        let private_der = codec::read_key_file(private_key_path)?;
        let private_key = codec::parse_private_key_der(&private_der)?;

        let public_der = codec::read_key_file(public_key_path)?;
        let public_key = codec::parse_public_key_der(&public_der)?;

        tracing::debug!(
            private = %private_key_path.display(),
            public = %public_key_path.display(),
            "Loaded RSA keypair from files"
        );

        Self::from_keys(private_key, public_key)
    }

    /// Load a keypair from base64-encoded DER.
    ///
    /// Unlike [`RsaKeyPair::load_from_files`] there is no format detection
    /// here: the decoded bytes must be PKCS8 (private) and PKIX (public) DER.
    pub fn load_from_encoded_bytes(
        private_key_base64: impl AsRef<[u8]>,
        public_key_base64: impl AsRef<[u8]>,
    ) -> Result<Self> {
        let private_der = STANDARD
            .decode(private_key_base64.as_ref())
            .map_err(|e| JwtError::Parse(format!("private key base64: {e}")))?;
        let public_der = STANDARD
            .decode(public_key_base64.as_ref())
            .map_err(|e| JwtError::Parse(format!("public key base64: {e}")))?;

        Self::load_from_der(&private_der, &public_der)
    }

    /// Load a keypair from PKCS8 (private) and PKIX (public) DER bytes.
    pub fn load_from_der(private_der: &[u8], public_der: &[u8]) -> Result<Self> {
        let private_key = codec::parse_private_key_der(private_der)?;
        let public_key = codec::parse_public_key_der(public_der)?;
        Self::from_keys(private_key, public_key)
    }

    /// Get the private key.
    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Get the public key.
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// PKCS8 DER encoding of the private key.
    pub fn private_key_der(&self) -> &[u8] {
        &self.private_key_pkcs8
    }

    /// PKIX DER encoding of the public key.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_pkix
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public_key.size() * 8
    }

    /// Private key as a PEM block without a type label.
    pub fn private_key_pem(&self) -> String {
        encode_untyped_pem(&self.private_key_pkcs8)
    }

    /// Public key as a PEM block without a type label.
    pub fn public_key_pem(&self) -> String {
        encode_untyped_pem(&self.public_key_pkix)
    }

    /// Private key DER as standard base64.
    pub fn private_key_base64(&self) -> String {
        STANDARD.encode(&self.private_key_pkcs8)
    }

    /// Public key DER as standard base64.
    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(&self.public_key_pkix)
    }

    /// Write the private key DER to `path`, replacing any existing file.
    pub fn write_private_key_der(&self, path: &Path) -> Result<()> {
        write_key_file(path, &self.private_key_pkcs8)
    }

    /// Write the public key DER to `path`, replacing any existing file.
    pub fn write_public_key_der(&self, path: &Path) -> Result<()> {
        write_key_file(path, &self.public_key_pkix)
    }

    /// Write the private key PEM to `path`, replacing any existing file.
    pub fn write_private_key_pem(&self, path: &Path) -> Result<()> {
        write_key_file(path, self.private_key_pem().as_bytes())
    }

    /// Write the public key PEM to `path`, replacing any existing file.
    pub fn write_public_key_pem(&self, path: &Path) -> Result<()> {
        write_key_file(path, self.public_key_pem().as_bytes())
    }
}

impl fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKeyPair")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

fn encode_untyped_pem(der: &[u8]) -> String {
    let block = Pem::new("", der.to_vec());
    pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

fn write_key_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(())
}
