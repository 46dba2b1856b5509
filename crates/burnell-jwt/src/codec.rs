//! Decoding of key files into RSA key objects.

use crate::error::{JwtError, Result};
use crate::format::KeyFormat;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rsa::pkcs8::der::Decode;
use rsa::pkcs8::spki::SubjectPublicKeyInfoRef;
use rsa::pkcs8::{ObjectIdentifier, PrivateKeyInfo};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::path::Path;

/// rsaEncryption (PKCS #1).
pub const RSA_ENCRYPTION_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

const PEM_BEGIN: &[u8] = b"-----BEGIN";
const PEM_BEGIN_UNLABELLED: &[u8] = b"-----BEGIN -----";
const PEM_END: &[u8] = b"-----END";

/// Return the DER payload of the first PEM block in `bytes`.
///
/// Anything before the block (e.g. `openssl s_client` chatter) is skipped
/// and the block label is not checked. Blocks with an empty label, as
/// written by [`RsaKeyPair`](crate::RsaKeyPair) exports, are accepted too.
pub fn decode_pem(bytes: &[u8]) -> Result<Vec<u8>> {
    let start = bytes
        .windows(PEM_BEGIN.len())
        .position(|window| window == PEM_BEGIN)
        .ok_or_else(|| JwtError::Parse("no PEM block: missing BEGIN line".to_string()))?;
    let block = &bytes[start..];

    // The pem crate requires a label.
    if block.starts_with(PEM_BEGIN_UNLABELLED) {
        return decode_unlabelled_block(block);
    }

    let block = pem::parse(block).map_err(|e| JwtError::Parse(format!("no PEM block: {e}")))?;
    Ok(block.contents().to_vec())
}

fn decode_unlabelled_block(block: &[u8]) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    for line in block.split(|b| *b == b'\n').skip(1) {
        let line = line.trim_ascii();
        if line.starts_with(PEM_END) {
            return STANDARD
                .decode(&body)
                .map_err(|e| JwtError::Parse(format!("PEM body: {e}")));
        }
        body.extend_from_slice(line);
    }
    Err(JwtError::Parse("no PEM block: missing END line".to_string()))
}

/// PKCS12 containers are passed through unparsed.
///
/// A real PKCS12 bundle therefore fails later, when the bytes are parsed as
/// PKCS8 or PKIX.
pub fn read_pkcs12(bytes: &[u8]) -> Vec<u8> {
    bytes.to_vec()
}

/// Detect the format of a key file's contents and extract its DER bytes.
pub fn key_material(bytes: &[u8]) -> Result<Vec<u8>> {
    let format = KeyFormat::detect_bytes(bytes)?;
    tracing::debug!(%format, len = bytes.len(), "Detected key format");

    match format {
        KeyFormat::Pem => decode_pem(bytes),
        KeyFormat::Der => Ok(bytes.to_vec()),
        KeyFormat::Pkcs12 => Ok(read_pkcs12(bytes)),
    }
}

/// Read a key file and extract its DER bytes.
pub fn read_key_file(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)?;
    key_material(&bytes)
}

/// Parse a PKCS8 `PrivateKeyInfo` holding an RSA key.
pub fn parse_private_key_der(der: &[u8]) -> Result<RsaPrivateKey> {
    let info = PrivateKeyInfo::from_der(der)
        .map_err(|e| JwtError::Parse(format!("PKCS8 private key: {e}")))?;

    ensure_rsa(info.algorithm.oid)?;

    RsaPrivateKey::try_from(info).map_err(|e| JwtError::Parse(format!("RSA private key: {e}")))
}

/// Parse a PKIX `SubjectPublicKeyInfo` holding an RSA key.
pub fn parse_public_key_der(der: &[u8]) -> Result<RsaPublicKey> {
    let info = SubjectPublicKeyInfoRef::from_der(der)
        .map_err(|e| JwtError::Parse(format!("PKIX public key: {e}")))?;

    ensure_rsa(info.algorithm.oid)?;

    RsaPublicKey::try_from(info).map_err(|e| JwtError::Parse(format!("RSA public key: {e}")))
}

fn ensure_rsa(oid: ObjectIdentifier) -> Result<()> {
    if oid == RSA_ENCRYPTION_OID {
        return Ok(());
    }
    Err(JwtError::TypeMismatch {
        expected: "RSA".to_string(),
        found: algorithm_name(&oid),
    })
}

fn algorithm_name(oid: &ObjectIdentifier) -> String {
    match oid.to_string().as_str() {
        "1.2.840.10045.2.1" => "EC".to_string(),
        "1.3.101.112" => "Ed25519".to_string(),
        "1.3.101.113" => "Ed448".to_string(),
        "1.2.840.10040.4.1" => "DSA".to_string(),
        "1.2.840.113549.1.1.10" => "RSASSA-PSS".to_string(),
        other => format!("OID {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    // PKCS8 and PKIX encodings of a P-256 key.
    const EC_PRIVATE_PKCS8: &str = "MIGHAgEAMBMGByqGSM49AgEGCCqGSM49AwEHBG0wawIBAQQgevZzL1gdAFr88hb2\
        OF/2NxApJCzGCEDdfSp6VQO30hyhRANCAAQRWz+jn65BtOMvdyHKcvjBeBSDZH2r\
        1RTwjmYSi9R/zpBnuQ4EiMnCqfMPWiZqB4QdbAd0E7oH50VpuZ1P087G";
    const EC_PUBLIC_SPKI: &str = "MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEEVs/o5+uQbTjL3chynL4wXgUg2R9\
        q9UU8I5mEovUf86QZ7kOBIjJwqnzD1omageEHWwHdBO6B+dFabmdT9POxg==";

    #[test]
    fn test_decode_pem_skips_preamble() {
        let der = vec![0x30, 0x03, 0x02, 0x01, 0x05];
        let block = pem::Pem::new("PUBLIC KEY", der.clone());
        let text = format!("CONNECTED(00000003)\n{}", pem::encode(&block));

        assert_eq!(decode_pem(text.as_bytes()).unwrap(), der);
    }

    #[test]
    fn test_decode_pem_without_label() {
        let der = vec![0x30, 0x03, 0x02, 0x01, 0x05];
        let text = format!(
            "CONNECTED(00000003)\r\n-----BEGIN -----\r\n{}\r\n-----END -----\r\n",
            STANDARD.encode(&der)
        );

        assert_eq!(decode_pem(text.as_bytes()).unwrap(), der);
    }

    #[test]
    fn test_decode_pem_without_end_line() {
        let err = decode_pem(b"-----BEGIN -----\nMAMCAQU=\n").unwrap_err();
        assert!(matches!(err, JwtError::Parse(_)));
    }

    #[test]
    fn test_decode_pem_without_block() {
        let err = decode_pem(b"----- not a pem file").unwrap_err();
        assert!(matches!(err, JwtError::Parse(_)));
    }

    #[test]
    fn test_pkcs12_is_passthrough() {
        let bytes = [0x30, 0x82, 0x01, 0x02, 0xAA, 0xBB];
        assert_eq!(read_pkcs12(&bytes), bytes.to_vec());
        assert_eq!(key_material(&bytes).unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_key_material_rejects_unknown() {
        assert!(matches!(
            key_material(b"ssh-rsa AAAA"),
            Err(JwtError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_garbage_der_is_parse_error() {
        let bytes = [0x30, 0x82, 0x01, 0x02, 0xAA, 0xBB];
        assert!(matches!(
            parse_private_key_der(&bytes),
            Err(JwtError::Parse(_))
        ));
        assert!(matches!(
            parse_public_key_der(&bytes),
            Err(JwtError::Parse(_))
        ));
    }

    #[test]
    fn test_ec_keys_are_type_mismatch() {
        let private = STANDARD.decode(EC_PRIVATE_PKCS8).unwrap();
        let public = STANDARD.decode(EC_PUBLIC_SPKI).unwrap();

        match parse_private_key_der(&private) {
            Err(JwtError::TypeMismatch { expected, found }) => {
                assert_eq!(expected, "RSA");
                assert_eq!(found, "EC");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
        assert!(matches!(
            parse_public_key_der(&public),
            Err(JwtError::TypeMismatch { .. })
        ));
    }
}
