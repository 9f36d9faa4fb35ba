//! Store configuration via `stencil.toml`
//!
//! A file-backed store keeps its settings in a config file in the store
//! directory. On first open, a default `stencil.toml` is created. To change
//! settings, edit the file and reopen the store.

use crate::recovery::CorruptionPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use stencil_core::{Result, StoreError};

/// Config file name placed in the store directory.
pub const CONFIG_FILE_NAME: &str = "stencil.toml";

/// Backend key holding the template envelope unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "task-templates";

/// Suffix appended to names of records renamed by a merge import.
pub const DEFAULT_IMPORT_SUFFIX: &str = " (Imported)";

/// Store configuration loaded from `stencil.toml`.
///
/// # Example
///
/// ```toml
/// storage_key = "task-templates"
/// on_corruption = "reset"
/// import_suffix = " (Imported)"
/// # max_bytes = 5242880
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StencilConfig {
    /// Backend key the envelope is stored under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// What `load` does with stored data that fails to parse or validate.
    #[serde(default)]
    pub on_corruption: CorruptionPolicy,
    /// Suffix appended to a record's name when a merge import re-identifies it.
    #[serde(default = "default_import_suffix")]
    pub import_suffix: String,
    /// Byte limit for the file backend; unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bytes: Option<u64>,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_import_suffix() -> String {
    DEFAULT_IMPORT_SUFFIX.to_string()
}

impl Default for StencilConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            on_corruption: CorruptionPolicy::default(),
            import_suffix: default_import_suffix(),
            max_bytes: None,
        }
    }
}

impl StencilConfig {
    /// Check values serde cannot check.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the storage key is empty or the byte limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(StoreError::ConfigError(
                "storage_key must not be empty".to_string(),
            ));
        }
        if self.max_bytes == Some(0) {
            return Err(StoreError::ConfigError(
                "max_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Stencil template store configuration
#
# Backend key holding the whole template collection.
storage_key = "task-templates"

# What to do when stored data is corrupt or fails validation:
#   "reset" = discard it, store an empty collection, keep going (default)
#   "fail"  = report ParseError / ValidationError and leave the data alone
on_corruption = "reset"

# Appended to the name of a record whose id collides during a merge import.
import_suffix = " (Imported)"

# Total byte limit for stored values (default: unlimited).
# max_bytes = 5242880
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: StencilConfig = toml::from_str(&content).map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                StoreError::ConfigError(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
