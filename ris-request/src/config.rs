//! Configuration for RIS request assembly

use serde::{Deserialize, Serialize};

use crate::request::{DEFAULT_SDK, DEFAULT_VERSION};

/// Request assembly configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RIS protocol version (`VERS`)
    pub version: String,

    /// SDK identifier (`SDK`)
    pub sdk: String,

    /// Start requests with KHASH payment encoding
    pub khash_enabled: bool,

    /// Salt for KHASH token hashing.
    ///
    /// Without one, hashing is unavailable: every payment token is sent in
    /// plaintext with an empty `PENC`, even when `khash_enabled` is true.
    pub khash_salt: Option<String>,

    /// Default merchant id (`MERC`)
    pub merchant_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            sdk: DEFAULT_SDK.to_string(),
            khash_enabled: true,
            khash_salt: None,
            merchant_id: None,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML document
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(version) = std::env::var("RIS_VERSION") {
            config.version = version;
        }

        if let Ok(sdk) = std::env::var("RIS_SDK") {
            config.sdk = sdk;
        }

        if let Ok(enabled) = std::env::var("RIS_KHASH_ENABLED") {
            config.khash_enabled = enabled.parse().map_err(|_| {
                crate::Error::Config(format!("RIS_KHASH_ENABLED must be true or false, got {:?}", enabled))
            })?;
        }

        if let Ok(salt) = std::env::var("RIS_KHASH_SALT") {
            config.khash_salt = Some(salt);
        }

        if let Ok(merchant_id) = std::env::var("RIS_MERCHANT_ID") {
            config.merchant_id = Some(merchant_id);
        }

        Ok(config)
    }
}
