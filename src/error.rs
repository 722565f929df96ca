//! Error types for xaregistry
//!
//! Provides a unified error type for all registry and recovery operations.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Result type alias using RegistryError
pub type Result<T> = std::result::Result<T, RegistryError>;

/// XA error codes surfaced to the owning protocol layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XaErrorCode {
    /// `XAER_RMERR`: an error occurred in the resource manager
    RmErr,
}

impl XaErrorCode {
    /// Numeric value as defined by the XA specification
    pub fn as_i32(self) -> i32 {
        match self {
            XaErrorCode::RmErr => -3,
        }
    }
}

impl fmt::Display for XaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XaErrorCode::RmErr => write!(f, "XAER_RMERR({})", self.as_i32()),
        }
    }
}

/// Unified error type for xaregistry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    // -------------------------------------------------------------------------
    // Live Registry Errors
    // -------------------------------------------------------------------------
    #[error("failed to create recovery file {}: {source}", .path.display())]
    CreateFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to append {locator} to recovery file {}: {source}", .path.display())]
    AppendFailed {
        locator: Url,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{code}: failed to delete recovery file {} for {resource}: {source}", .path.display())]
    DeleteFailed {
        code: XaErrorCode,
        path: PathBuf,
        resource: String,
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Recovery Errors
    // -------------------------------------------------------------------------
    #[error("failed to read recovery file {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed record {line:?} in recovery file {}: {source}", .path.display())]
    MalformedRecord {
        line: String,
        path: PathBuf,
        source: url::ParseError,
    },

    #[error("failed to list recovery directory {}: {source}", .path.display())]
    ListFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Identifier Errors
    // -------------------------------------------------------------------------
    #[error("Invalid xid: {0}")]
    InvalidXid(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// Path of the recovery file or directory involved, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            RegistryError::CreateFailed { path, .. }
            | RegistryError::AppendFailed { path, .. }
            | RegistryError::DeleteFailed { path, .. }
            | RegistryError::ReadFailed { path, .. }
            | RegistryError::MalformedRecord { path, .. }
            | RegistryError::ListFailed { path, .. } => Some(path),
            RegistryError::InvalidXid(_) | RegistryError::Config(_) => None,
        }
    }

    /// XA error code carried by this error, if it maps onto one
    pub fn xa_code(&self) -> Option<XaErrorCode> {
        match self {
            RegistryError::DeleteFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}
