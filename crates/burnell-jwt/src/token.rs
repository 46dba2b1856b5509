//! Token creation and verification.

use crate::algorithm::SigningAlgorithm;
use crate::claims::Claims;
use crate::duration::parse_expiry;
use crate::error::{JwtError, Result};
use crate::keys::RsaKeyPair;
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{Duration, Utc};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unpadded base64url for output; padded segments are still accepted.
const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const TOKEN_TYPE: &str = "JWT";

/// JOSE header of a compact token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// Validate the expiry and algorithm settings used to issue tokens.
pub fn resolve_claims(expiry: &str, algorithm: &str) -> Result<(Duration, SigningAlgorithm)> {
    let duration = parse_expiry(expiry)?;
    let algorithm = algorithm.parse()?;
    Ok((duration, algorithm))
}

/// Issues tokens signed with an RSA private key.
#[derive(Clone)]
pub struct TokenIssuer {
    private_key: RsaPrivateKey,
}

impl TokenIssuer {
    /// Create an issuer for the private half of `keypair`.
    pub fn new(keypair: &RsaKeyPair) -> Self {
        Self::from_private_key(keypair.private_key().clone())
    }

    pub fn from_private_key(private_key: RsaPrivateKey) -> Self {
        Self { private_key }
    }

    /// Issue a token for `subject`.
    ///
    /// With a positive `expires_in` the token carries `iat` and `exp`,
    /// otherwise it only carries `sub` and never expires. Algorithms that
    /// cannot sign with an RSA key fail with [`JwtError::Signing`].
    pub fn issue(
        &self,
        subject: &str,
        expires_in: Duration,
        algorithm: SigningAlgorithm,
    ) -> Result<String> {
        let claims = Claims::issued_now(subject, expires_in)?;
        let token = self.issue_claims(&claims, algorithm)?;

        tracing::debug!(
            subject,
            algorithm = %algorithm,
            exp = ?claims.exp,
            "Issued token"
        );

        Ok(token)
    }

    /// Sign arbitrary claims.
    pub fn issue_claims(&self, claims: &Claims, algorithm: SigningAlgorithm) -> Result<String> {
        let header = Header {
            alg: algorithm.as_str().to_string(),
            typ: Some(TOKEN_TYPE.to_string()),
        };

        let signing_input = format!(
            "{}.{}",
            encode_segment(&header)?,
            encode_segment(claims)?
        );
        let signature = algorithm.sign(signing_input.as_bytes(), &self.private_key)?;

        Ok(format!("{signing_input}.{}", BASE64URL.encode(signature)))
    }
}

/// Verifies tokens against an RSA public key.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    public_key: RsaPublicKey,
}

impl TokenVerifier {
    /// Create a verifier for the public half of `keypair`.
    pub fn new(keypair: &RsaKeyPair) -> Self {
        Self::from_public_key(keypair.public_key().clone())
    }

    pub fn from_public_key(public_key: RsaPublicKey) -> Self {
        Self { public_key }
    }

    /// Verify a token's structure, signature and time claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let result = self.verify_inner(token);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Token verification failed");
        }
        result
    }

    fn verify_inner(&self, token: &str) -> Result<Claims> {
        let segments = Segments::split(token)?;

        let header: Header = decode_segment(segments.header)?;
        let algorithm = SigningAlgorithm::ALL
            .into_iter()
            .find(|alg| alg.as_str() == header.alg)
            .ok_or_else(|| {
                JwtError::InvalidToken(format!("signing method {} is unavailable", header.alg))
            })?;

        let signature = BASE64URL
            .decode(segments.signature)
            .map_err(|e| JwtError::InvalidToken(format!("signature encoding: {e}")))?;
        algorithm.verify(
            segments.signing_input.as_bytes(),
            &signature,
            &self.public_key,
        )?;

        let payload: Map<String, Value> = decode_segment(segments.payload)?;
        let claims = Claims::from_json(&payload)?;

        let now = Utc::now().timestamp();
        if claims.exp.is_some_and(|exp| now > exp) {
            return Err(JwtError::InvalidToken("token is expired".to_string()));
        }
        if claims.iat.is_some_and(|iat| now < iat) {
            return Err(JwtError::InvalidToken("token used before issued".to_string()));
        }

        Ok(claims)
    }

    /// Verify a token and return its subject.
    pub fn subject(&self, token: &str) -> Result<String> {
        match self.verify(token) {
            Ok(claims) => claims.subject().map(str::to_string),
            Err(JwtError::ClaimType { claim: "sub", .. }) => Err(JwtError::MissingSubject),
            Err(e) => Err(e),
        }
    }

    /// Verify a token and require its subject to equal `expected`.
    ///
    /// A valid token for another subject is a [`JwtError::SubjectMismatch`],
    /// distinct from an invalid token.
    pub fn verify_subject(&self, token: &str, expected: &str) -> Result<bool> {
        let actual = self.subject(token)?;
        if actual == expected {
            return Ok(true);
        }

        tracing::warn!(expected, actual = %actual, "Token subject mismatch");
        Err(JwtError::SubjectMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Decoded header and payload of a token, not verified.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub header: Header,
    pub payload: Map<String, Value>,
}

impl TokenInfo {
    /// Typed view of the payload.
    pub fn claims(&self) -> Result<Claims> {
        Claims::from_json(&self.payload)
    }
}

/// Inspect a token without verification (for debugging).
pub fn inspect_token_unverified(token: &str) -> Result<TokenInfo> {
    let segments = Segments::split(token)?;
    Ok(TokenInfo {
        header: decode_segment(segments.header)?,
        payload: decode_segment(segments.payload)?,
    })
}

struct Segments<'a> {
    header: &'a str,
    payload: &'a str,
    signature: &'a str,
    signing_input: &'a str,
}

impl<'a> Segments<'a> {
    fn split(token: &'a str) -> Result<Self> {
        let token = token.trim();
        let (signing_input, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| malformed("token contains an invalid number of segments"))?;
        let (header, payload) = signing_input
            .split_once('.')
            .ok_or_else(|| malformed("token contains an invalid number of segments"))?;

        if payload.contains('.') {
            return Err(malformed("token contains an invalid number of segments"));
        }

        Ok(Self {
            header,
            payload,
            signature,
            signing_input,
        })
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_vec(value).map_err(|e| JwtError::Signing(e.to_string()))?;
    Ok(BASE64URL.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T> {
    let bytes = BASE64URL
        .decode(segment)
        .map_err(|e| malformed(&format!("segment encoding: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| malformed(&format!("segment JSON: {e}")))
}

fn malformed(reason: &str) -> JwtError {
    JwtError::InvalidToken(reason.to_string())
}
