//! JWS signing algorithms.
//!
//! Every algorithm name a token may carry can be resolved, but only the RSA
//! families can actually sign or verify: the keypair this crate manages is
//! always RSA. HMAC, ECDSA and `none` fail at signing/verification time with
//! a key type error.

use crate::error::{JwtError, Result};
use rsa::pkcs1v15;
use rsa::pss;
use rsa::rand_core::OsRng;
use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

/// Signing algorithm identifier, as carried in the token header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    RS256,
    RS384,
    RS512,
    HS256,
    HS384,
    HS512,
    ES256,
    ES384,
    ES512,
    PS256,
    PS384,
    PS512,
    None,
}

/// Cryptographic scheme behind an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmFamily {
    /// RSASSA-PKCS1-v1_5
    RsaPkcs1,
    /// HMAC-SHA2
    Hmac,
    /// ECDSA over NIST curves
    Ecdsa,
    /// RSASSA-PSS
    RsaPss,
    /// Unsigned token
    Unsigned,
}

impl SigningAlgorithm {
    pub const ALL: [SigningAlgorithm; 13] = [
        Self::RS256,
        Self::RS384,
        Self::RS512,
        Self::HS256,
        Self::HS384,
        Self::HS512,
        Self::ES256,
        Self::ES384,
        Self::ES512,
        Self::PS256,
        Self::PS384,
        Self::PS512,
        Self::None,
    ];

    /// Look up an algorithm by name, ignoring ASCII case.
    pub fn resolve(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.as_str().eq_ignore_ascii_case(name))
    }

    /// Header name of the algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
            Self::None => "none",
        }
    }

    pub fn family(&self) -> AlgorithmFamily {
        match self {
            Self::RS256 | Self::RS384 | Self::RS512 => AlgorithmFamily::RsaPkcs1,
            Self::HS256 | Self::HS384 | Self::HS512 => AlgorithmFamily::Hmac,
            Self::ES256 | Self::ES384 | Self::ES512 => AlgorithmFamily::Ecdsa,
            Self::PS256 | Self::PS384 | Self::PS512 => AlgorithmFamily::RsaPss,
            Self::None => AlgorithmFamily::Unsigned,
        }
    }

    /// Sign `message` with an RSA private key.
    pub fn sign(&self, message: &[u8], key: &RsaPrivateKey) -> Result<Vec<u8>> {
        let signature = match self {
            Self::RS256 => pkcs1v15::SigningKey::<Sha256>::new(key.clone())
                .try_sign(message)
                .map(|s| s.to_vec()),
            Self::RS384 => pkcs1v15::SigningKey::<Sha384>::new(key.clone())
                .try_sign(message)
                .map(|s| s.to_vec()),
            Self::RS512 => pkcs1v15::SigningKey::<Sha512>::new(key.clone())
                .try_sign(message)
                .map(|s| s.to_vec()),
            Self::PS256 => pss::BlindedSigningKey::<Sha256>::new(key.clone())
                .try_sign_with_rng(&mut OsRng, message)
                .map(|s| s.to_vec()),
            Self::PS384 => pss::BlindedSigningKey::<Sha384>::new(key.clone())
                .try_sign_with_rng(&mut OsRng, message)
                .map(|s| s.to_vec()),
            Self::PS512 => pss::BlindedSigningKey::<Sha512>::new(key.clone())
                .try_sign_with_rng(&mut OsRng, message)
                .map(|s| s.to_vec()),
            _ => return Err(JwtError::Signing(self.key_type_error())),
        };

        signature.map_err(|e| JwtError::Signing(format!("{self}: {e}")))
    }

    /// Check `signature` over `message` with an RSA public key.
    pub fn verify(&self, message: &[u8], signature: &[u8], key: &RsaPublicKey) -> Result<()> {
        let outcome = match self {
            Self::RS256 => verify_pkcs1v15(
                &pkcs1v15::VerifyingKey::<Sha256>::new(key.clone()),
                message,
                signature,
            ),
            Self::RS384 => verify_pkcs1v15(
                &pkcs1v15::VerifyingKey::<Sha384>::new(key.clone()),
                message,
                signature,
            ),
            Self::RS512 => verify_pkcs1v15(
                &pkcs1v15::VerifyingKey::<Sha512>::new(key.clone()),
                message,
                signature,
            ),
            Self::PS256 => verify_pss(
                &pss::VerifyingKey::<Sha256>::new(key.clone()),
                message,
                signature,
            ),
            Self::PS384 => verify_pss(
                &pss::VerifyingKey::<Sha384>::new(key.clone()),
                message,
                signature,
            ),
            Self::PS512 => verify_pss(
                &pss::VerifyingKey::<Sha512>::new(key.clone()),
                message,
                signature,
            ),
            _ => return Err(JwtError::InvalidToken(self.key_type_error())),
        };

        outcome.map_err(|e| JwtError::InvalidToken(format!("{self}: {e}")))
    }

    fn key_type_error(&self) -> String {
        match self.family() {
            AlgorithmFamily::Unsigned => "'none' signature type is not allowed".to_string(),
            family => format!("key is of invalid type: {self} ({family:?}) cannot use an RSA key"),
        }
    }
}

fn verify_pkcs1v15<V>(
    key: &V,
    message: &[u8],
    signature: &[u8],
) -> std::result::Result<(), rsa::signature::Error>
where
    V: Verifier<pkcs1v15::Signature>,
{
    let signature = pkcs1v15::Signature::try_from(signature)?;
    key.verify(message, &signature)
}

fn verify_pss<V>(
    key: &V,
    message: &[u8],
    signature: &[u8],
) -> std::result::Result<(), rsa::signature::Error>
where
    V: Verifier<pss::Signature>,
{
    let signature = pss::Signature::try_from(signature)?;
    key.verify(message, &signature)
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s).ok_or_else(|| JwtError::UnknownAlgorithm(s.to_string()))
    }
}

impl Serialize for SigningAlgorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SigningAlgorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
