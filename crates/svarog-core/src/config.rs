//! Svarog configuration module.
//!
//! Provides configuration file support via `svarog.toml`, environment
//! variables, and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`SVAROG_*`)
//! 2. Configuration file (`svarog.toml`)
//! 3. Default values

use crate::error::{Error, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Index parameter defaults section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexDefaults {
    /// Number of bi-directional links per vertex above the base layer
    /// (M parameter). The base layer allows `2 * m`.
    pub m: usize,
    /// Size of the dynamic candidate list at query time.
    pub ef: usize,
    /// Size of the dynamic candidate list during construction.
    /// Clamped up to `m` at index construction.
    pub ef_construction: usize,
    /// Advisory capacity bound carried in the descriptor.
    pub max_item_count: usize,
}

impl Default for IndexDefaults {
    fn default() -> Self {
        Self {
            m: 16,
            ef: 64,
            ef_construction: 128,
            max_item_count: 1_000_000,
        }
    }
}

/// Bulk import section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Number of vertices (pass 1) or edge sources (pass 3) per transaction.
    pub transaction_batch_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            transaction_batch_size: 1024,
        }
    }
}

/// Top-level Svarog configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SvarogConfig {
    /// Index parameter defaults.
    pub index: IndexDefaults,
    /// Bulk import tuning.
    pub import: ImportConfig,
}

impl SvarogConfig {
    /// Loads configuration from default sources (`svarog.toml` + env).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from_path("svarog.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SVAROG_").split("_").lowercase(false));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if !(2..=128).contains(&self.index.m) {
            return Err(Error::Config(format!(
                "index.m value {} is out of range [2, 128]",
                self.index.m
            )));
        }

        if self.index.ef == 0 {
            return Err(Error::Config("index.ef must be at least 1".to_string()));
        }

        if self.index.ef_construction == 0 {
            return Err(Error::Config(
                "index.ef_construction must be at least 1".to_string(),
            ));
        }

        if self.import.transaction_batch_size == 0 {
            return Err(Error::Config(
                "import.transaction_batch_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
