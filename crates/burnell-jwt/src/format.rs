//! Key file format detection.
//!
//! Classification only looks at the first four bytes of a file. It is a
//! heuristic and will happily misclassify unusual inputs.

use crate::error::{JwtError, Result};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// `-----`, the start of a PEM boundary line.
const MAGIC_PEM_DASHES: u32 = 0x2D2D_2D2D;
/// `CONN`, what `openssl s_client` prints before the PEM block.
const MAGIC_PEM_CONNECTED: u32 = 0x434F_4E4E;
/// ASN.1 SEQUENCE with a two-byte long-form length.
const MAGIC_DER_SEQUENCE: u32 = 0x3082_0000;

/// Encoding of a key file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Pem,
    Der,
    Pkcs12,
}

impl KeyFormat {
    /// Classify a key file from its first four bytes.
    pub fn detect(magic: [u8; 4]) -> Result<Self> {
        let magic = u32::from_be_bytes(magic);

        if magic == MAGIC_PEM_DASHES || magic == MAGIC_PEM_CONNECTED {
            return Ok(Self::Pem);
        }

        if magic & 0xFFFF_0000 == MAGIC_DER_SEQUENCE {
            // Either an X.509/PKCS8 structure or a PKCS12 container.
            if magic & 0x0000_FF00 == 0x0300 {
                return Ok(Self::Der);
            }
            return Ok(Self::Pkcs12);
        }

        Err(JwtError::UnsupportedFormat(format!("magic {magic:#010x}")))
    }

    /// Classify a byte buffer. Buffers shorter than four bytes are rejected.
    pub fn detect_bytes(bytes: &[u8]) -> Result<Self> {
        let magic: [u8; 4] = bytes
            .get(..4)
            .and_then(|head| head.try_into().ok())
            .ok_or_else(|| {
                JwtError::UnsupportedFormat(format!("need 4 bytes, got {}", bytes.len()))
            })?;
        Self::detect(magic)
    }

    /// Classify a file by peeking at its first four bytes.
    pub fn detect_file(path: &Path) -> Result<Self> {
        let mut magic = [0u8; 4];
        let mut file = File::open(path)?;
        file.read_exact(&mut magic).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => {
                JwtError::UnsupportedFormat(format!("{} is too short", path.display()))
            }
            _ => JwtError::Io(e),
        })?;
        Self::detect(magic)
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pem => "PEM",
            Self::Der => "DER",
            Self::Pkcs12 => "PKCS12",
        };
        f.write_str(name)
    }
}
