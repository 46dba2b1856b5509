//! # burnell-jwt
//!
//! RSA key handling and JWT issuance for Burnell.
//!
//! This crate provides functionality for:
//! - Generating RSA keypairs and loading them from PEM, DER or base64 DER
//! - Exporting keys as PEM, base64 or raw DER files
//! - Issuing compact tokens with a subject and optional expiry
//! - Verifying tokens and checking their subject
//!
//! Tokens follow the `pulsar tokens` convention: the subject is carried in
//! `sub`, and expiry durations accept `d` (day) and `y` (365-day year)
//! suffixes on top of the usual `h`/`m`/`s` units.
//!
//! ```no_run
//! use burnell_jwt::{RsaKeyPair, SigningAlgorithm, TokenIssuer, TokenVerifier, parse_expiry};
//!
//! # fn main() -> burnell_jwt::Result<()> {
//! let keypair = RsaKeyPair::generate_default()?;
//! let token = TokenIssuer::new(&keypair).issue(
//!     "tenant-a",
//!     parse_expiry("7d")?,
//!     SigningAlgorithm::RS256,
//! )?;
//! assert!(TokenVerifier::new(&keypair).verify_subject(&token, "tenant-a")?);
//! # Ok(())
//! # }
//! ```

pub mod algorithm;
pub mod claims;
pub mod codec;
pub mod duration;
pub mod error;
pub mod format;
pub mod keys;
pub mod token;

pub use rsa::{RsaPrivateKey, RsaPublicKey};

pub use algorithm::{AlgorithmFamily, SigningAlgorithm};
pub use claims::{Claims, EXPIRE_OFFSET_SECS, remaining_validity};
pub use duration::parse_expiry;
pub use error::{JwtError, Result};
pub use format::KeyFormat;
pub use keys::{DEFAULT_KEY_BITS, RsaKeyPair};
pub use token::{
    Header, TokenInfo, TokenIssuer, TokenVerifier, inspect_token_unverified, resolve_claims,
};
