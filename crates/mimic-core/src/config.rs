//! Bridge configuration (mimic.toml)
//!
//! ```toml
//! [bridge]
//! bootstrap_complete = true
//! cache_descriptors = true
//! excluded_classes = ["demo/Clock", "demo.Random"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::descriptor::internalize;

/// Errors that can occur while loading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MimicConfig {
    /// Dispatch bridge settings
    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// Settings for a [`MockBridge`](crate::MockBridge)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    /// Treat the host as already bootstrapped.
    ///
    /// When false the bridge follows the process-wide readiness flag.
    #[serde(default)]
    pub bootstrap_complete: bool,

    /// Cache parsed parameter lists per descriptor
    #[serde(default = "default_cache_descriptors")]
    pub cache_descriptors: bool,

    /// Classes whose calls always run the real implementation, internal or
    /// canonical form
    #[serde(default)]
    pub excluded_classes: Vec<String>,
}

fn default_cache_descriptors() -> bool {
    true
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bootstrap_complete: false,
            cache_descriptors: default_cache_descriptors(),
            excluded_classes: Vec::new(),
        }
    }
}

impl BridgeConfig {
    /// Load the `[bridge]` table from a file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse the `[bridge]` table from a string; a missing table yields
    /// defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MimicConfig = toml::from_str(content)?;
        config.bridge.validate()?;
        Ok(config.bridge.normalized())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for class in &self.excluded_classes {
            if class.is_empty() {
                return Err(ConfigError::ValidationError(
                    "Excluded class name cannot be empty".to_string(),
                ));
            }
            if class.chars().any(|c| c.is_whitespace() || c == ';') {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid excluded class name: {:?}",
                    class
                )));
            }
        }
        Ok(())
    }

    /// Excluded classes converted to internal form, sorted and deduplicated
    pub fn normalized(mut self) -> Self {
        let mut classes: Vec<String> = self
            .excluded_classes
            .iter()
            .map(|c| internalize(c))
            .collect();
        classes.sort();
        classes.dedup();
        self.excluded_classes = classes;
        self
    }
}
