//! Configuration for xaregistry
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

/// Name of the directory, under the base directory, holding registry files
pub const RECOVERY_DIR: &str = "xa-recovery";

/// Main configuration for a recovery log
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory the recovery directory is relative to
    /// Internal structure:
    ///   {base_dir}/
    ///     └── xa-recovery/
    ///           ├── {hex xid}    (one registry file per transaction)
    ///           └── ...
    pub base_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// How an append is forced to disk before it returns
    pub sync_mode: SyncMode,
}

/// Durability barrier used after every append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// fsync data and metadata (`File::sync_all`)
    Full,

    /// fdatasync, skipping metadata not needed to read the data back
    Data,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            sync_mode: SyncMode::Full,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Directory holding the registry files
    pub fn recovery_dir(&self) -> PathBuf {
        recovery_dir_for(&self.base_dir)
    }
}

/// Recovery directory for a given base directory
pub fn recovery_dir_for(base_dir: &Path) -> PathBuf {
    base_dir.join(RECOVERY_DIR)
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the base directory (the recovery directory is created inside it)
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_dir = path.into();
        self
    }

    /// Set the append durability mode
    pub fn sync_mode(mut self, mode: SyncMode) -> Self {
        self.config.sync_mode = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
