//! Configuration system for the decoders

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default ceiling for a single inflated archive entry (256 MiB)
pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 256 * 1024 * 1024;

/// Main decoder configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeConfig {
    #[serde(default)]
    pub container: ContainerConfig,
    #[serde(default)]
    pub legacy: LegacyConfig,
}

impl DecodeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DecodeConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used
    pub fn validate(&self) -> Result<()> {
        if self.container.max_entry_size == 0 {
            anyhow::bail!("Configuration error: container.max_entry_size must be greater than 0");
        }

        if encoding_rs::Encoding::for_label(self.legacy.fallback_encoding.as_bytes()).is_none() {
            anyhow::bail!(
                "Configuration error: unknown legacy.fallback_encoding '{}'",
                self.legacy.fallback_encoding
            );
        }

        Ok(())
    }
}

/// ZIP container settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Largest uncompressed entry size accepted, in bytes
    #[serde(default = "default_max_entry_size")]
    pub max_entry_size: u64,
    /// Fail when the directory walk ends before the EOCD's declared entry count
    #[serde(default)]
    pub strict_directory: bool,
    /// Compare the CRC-32 of extracted data against the central directory
    #[serde(default = "default_true")]
    pub verify_crc: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
            strict_directory: false,
            verify_crc: true,
        }
    }
}

/// HTML-based `.xls` settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyConfig {
    /// Encoding label used when the body has no BOM and is not valid UTF-8
    #[serde(default = "default_fallback_encoding")]
    pub fallback_encoding: String,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            fallback_encoding: default_fallback_encoding(),
        }
    }
}

fn default_max_entry_size() -> u64 {
    DEFAULT_MAX_ENTRY_SIZE
}

fn default_true() -> bool {
    true
}

fn default_fallback_encoding() -> String {
    "windows-1252".to_string()
}
