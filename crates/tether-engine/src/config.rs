//! Bridge configuration (`tether.toml`)
//!
//! ```toml
//! [bridge]
//! channel = "tether/bridge"
//! registrar = "Registrar"
//!
//! [access]
//! default = "ALL"
//!
//! [access.types]
//! "host.vault.*" = "PUBLIC_ONLY"
//! ```
//!
//! Every section is optional.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::access::{AccessFlags, AccessPolicy};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Parsed but not valid
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Channel settings
    #[serde(default)]
    pub bridge: BridgeSection,

    /// Access policy
    #[serde(default)]
    pub access: AccessSection,
}

/// `[bridge]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeSection {
    /// Channel name the host listens on (informational)
    #[serde(default = "default_channel")]
    pub channel: String,

    /// Global name the host registrar is published under
    #[serde(default = "default_registrar")]
    pub registrar: String,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            registrar: default_registrar(),
        }
    }
}

fn default_channel() -> String {
    "tether/bridge".to_string()
}

fn default_registrar() -> String {
    "Registrar".to_string()
}

/// `[access]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessSection {
    /// Flags for types without a rule
    #[serde(default = "default_access")]
    pub default: String,

    /// Per-type rules: type name or pattern -> flags
    #[serde(default)]
    pub types: BTreeMap<String, String>,
}

impl Default for AccessSection {
    fn default() -> Self {
        Self {
            default: default_access(),
            types: BTreeMap::new(),
        }
    }
}

fn default_access() -> String {
    "ALL".to_string()
}

impl BridgeConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.channel.is_empty() {
            return Err(ConfigError::Invalid("bridge.channel cannot be empty".to_string()));
        }
        if self.bridge.registrar.is_empty() {
            return Err(ConfigError::Invalid("bridge.registrar cannot be empty".to_string()));
        }
        self.access_policy().map(|_| ())
    }

    /// Build the access policy described by `[access]`
    pub fn access_policy(&self) -> Result<AccessPolicy, ConfigError> {
        let default = parse_flags("access.default", &self.access.default)?;
        let mut policy = AccessPolicy::with_default(default);
        for (pattern, flags) in &self.access.types {
            if pattern.is_empty() {
                return Err(ConfigError::Invalid(
                    "access.types keys cannot be empty".to_string(),
                ));
            }
            let flags = parse_flags(&format!("access.types.\"{}\"", pattern), flags)?;
            policy.add_rule(pattern.as_str(), flags);
        }
        Ok(policy)
    }
}

fn parse_flags(key: &str, value: &str) -> Result<AccessFlags, ConfigError> {
    AccessFlags::parse(value)
        .ok_or_else(|| ConfigError::Invalid(format!("{}: invalid access flags '{}'", key, value)))
}
