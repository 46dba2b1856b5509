//! CLI configuration.
//!
//! Loaded from a YAML file (`burnell.yaml` by default when present):
//!
//! ```yaml
//! keys:
//!   private_key_file: keys/private.key
//!   public_key_file: keys/public.key
//!   # base64 PKCS8/PKIX DER, used when no key file is configured
//!   private_key_env: BURNELL_PRIVATE_KEY
//!   public_key_env: BURNELL_PUBLIC_KEY
//! token:
//!   algorithm: RS256
//!   expiry: 24h
//!   key_bits: 2048
//! ```

use burnell_jwt::{DEFAULT_KEY_BITS, SigningAlgorithm};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "burnell.yaml";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BurnellConfig {
    /// Where key material comes from.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Defaults for issued tokens.
    #[serde(default)]
    pub token: TokenConfig,
}

/// Key material locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeysConfig {
    /// Path to the private key file (PEM, DER or PKCS12).
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,

    /// Path to the public key file (PEM, DER or PKCS12).
    #[serde(default)]
    pub public_key_file: Option<PathBuf>,

    /// Environment variable containing the private key (base64 DER).
    #[serde(default)]
    pub private_key_env: Option<String>,

    /// Environment variable containing the public key (base64 DER).
    #[serde(default)]
    pub public_key_env: Option<String>,
}

/// Token issuance defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Signing algorithm name.
    #[serde(default = "default_algorithm")]
    pub algorithm: SigningAlgorithm,

    /// Expiry duration, e.g. "24h", "7d", "1y". "0" for no expiry.
    #[serde(default = "default_expiry")]
    pub expiry: String,

    /// Modulus size for generated keys.
    #[serde(default = "default_key_bits")]
    pub key_bits: usize,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            expiry: default_expiry(),
            key_bits: default_key_bits(),
        }
    }
}

impl BurnellConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the explicit config file, else `burnell.yaml` if it exists,
    /// else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                tracing::info!(config = %path.display(), "Loading configuration");
                Self::from_file(path)
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                tracing::info!(config = DEFAULT_CONFIG_FILE, "Loading configuration");
                Self::from_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        burnell_jwt::parse_expiry(&self.token.expiry)
            .map_err(|e| ConfigError::Config(format!("token.expiry: {e}")))?;

        if self.token.key_bits < burnell_jwt::keys::MIN_KEY_BITS {
            return Err(ConfigError::Config(format!(
                "token.key_bits must be at least {}",
                burnell_jwt::keys::MIN_KEY_BITS
            )));
        }

        Ok(())
    }
}

impl KeysConfig {
    /// Read the base64 private key from the configured environment variable.
    pub fn private_key_from_env(&self) -> Option<String> {
        self.private_key_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
    }

    /// Read the base64 public key from the configured environment variable.
    pub fn public_key_from_env(&self) -> Option<String> {
        self.public_key_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
    }
}

fn default_algorithm() -> SigningAlgorithm {
    SigningAlgorithm::RS256
}

fn default_expiry() -> String {
    "24h".to_string()
}

fn default_key_bits() -> usize {
    DEFAULT_KEY_BITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BurnellConfig::from_yaml("{}").unwrap();
        assert_eq!(config.token.algorithm, SigningAlgorithm::RS256);
        assert_eq!(config.token.expiry, "24h");
        assert_eq!(config.token.key_bits, 2048);
        assert!(config.keys.private_key_file.is_none());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
keys:
  private_key_file: /etc/burnell/private.key
  public_key_file: /etc/burnell/public.key
  public_key_env: BURNELL_PUBLIC_KEY
token:
  algorithm: ps256
  expiry: 7d
  key_bits: 4096
"#;
        let config = BurnellConfig::from_yaml(yaml).unwrap();
        assert_eq!(
            config.keys.private_key_file.as_deref(),
            Some(Path::new("/etc/burnell/private.key"))
        );
        assert_eq!(config.keys.public_key_env.as_deref(), Some("BURNELL_PUBLIC_KEY"));
        assert_eq!(config.token.algorithm, SigningAlgorithm::PS256);
        assert_eq!(config.token.expiry, "7d");
        assert_eq!(config.token.key_bits, 4096);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            BurnellConfig::from_yaml("token:\n  algorithm: XS256\n"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            BurnellConfig::from_yaml("token:\n  expiry: forever\n"),
            Err(ConfigError::Config(_))
        ));
        assert!(matches!(
            BurnellConfig::from_yaml("token:\n  key_bits: 128\n"),
            Err(ConfigError::Config(_))
        ));
    }

    #[test]
    fn test_env_keys() {
        // SAFETY: We're in a test and controlling the environment
        unsafe {
            std::env::set_var("BURNELL_TEST_PUBLIC_KEY", "TUlJQg==");
        }

        let keys = KeysConfig {
            public_key_env: Some("BURNELL_TEST_PUBLIC_KEY".to_string()),
            ..Default::default()
        };
        assert_eq!(keys.public_key_from_env().as_deref(), Some("TUlJQg=="));
        assert_eq!(keys.private_key_from_env(), None);

        // SAFETY: Cleanup in test
        unsafe {
            std::env::remove_var("BURNELL_TEST_PUBLIC_KEY");
        }
    }
}
