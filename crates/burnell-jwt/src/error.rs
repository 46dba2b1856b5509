//! Error types for the JWT crate.

use thiserror::Error;

/// Errors that can occur during key handling and token operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Key generation or post-generation validation failed.
    #[error("failed to generate keypair: {0}")]
    Generation(String),

    /// Key file bytes could not be classified.
    #[error("undetermined key format: {0}")]
    UnsupportedFormat(String),

    /// ASN.1, PKCS8, PKIX, PEM or base64 decoding failed.
    #[error("failed to parse key: {0}")]
    Parse(String),

    /// The key decoded fine but is not an RSA key.
    #[error("expected {expected} key, but actual was {found}")]
    TypeMismatch { expected: String, found: String },

    /// Algorithm name does not resolve to a signing algorithm.
    #[error("invalid JWT signing method {0}")]
    UnknownAlgorithm(String),

    /// Signing failed, e.g. algorithm family incompatible with the key.
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// Token is malformed or its signature does not verify.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token has no string `sub` claim.
    #[error("missing subjects")]
    MissingSubject,

    /// Token is valid but carries another subject.
    #[error("incorrect sub: expected {expected}, got {actual}")]
    SubjectMismatch { expected: String, actual: String },

    /// Expiry duration string matches no supported grammar.
    #[error("invalid duration {0}")]
    InvalidDuration(String),

    /// A registered claim has the wrong JSON type.
    #[error("claim `{claim}` must be {expected}")]
    ClaimType {
        claim: &'static str,
        expected: &'static str,
    },

    /// IO error (reading/writing keys).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, JwtError>;
