//! Store configuration

use crate::root::{CACHE_DIR_ENV, default_root};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable setting the zstd compression level
pub const COMPRESSION_LEVEL_ENV: &str = "MEMOIR_COMPRESSION_LEVEL";

/// Default zstd compression level for records
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Configuration for a filesystem result store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Store root; resolved with [`default_root`] when unset
    pub root: Option<PathBuf>,
    /// zstd compression level for new records
    pub compression_level: i32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl StoreConfig {
    /// Read configuration from `MEMOIR_CACHE_DIR` and `MEMOIR_COMPRESSION_LEVEL`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the compression level is not a valid
    /// zstd level
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(CACHE_DIR_ENV)
            && !dir.trim().is_empty()
        {
            config.root = Some(PathBuf::from(dir));
        }
        if let Ok(level) = std::env::var(COMPRESSION_LEVEL_ENV) {
            config.compression_level = level.trim().parse().map_err(|e| {
                Error::configuration(format!(
                    "{COMPRESSION_LEVEL_ENV}={level:?} is not an integer: {e}"
                ))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an out-of-range compression level
    pub fn validate(&self) -> Result<()> {
        let range = zstd::compression_level_range();
        if !range.contains(&self.compression_level) {
            return Err(Error::configuration(format!(
                "compression level {} is outside {}..={}",
                self.compression_level,
                range.start(),
                range.end()
            )));
        }
        Ok(())
    }

    /// The configured root, or the default root when none is configured
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no writable default root exists
    pub fn resolve_root(&self) -> Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => default_root(),
        }
    }
}
