//! # xaregistry
//!
//! A durable, crash-recoverable registry of outflowed XA resources:
//! - One append-only, exclusively locked log file per transaction
//! - Every locator forced to disk before the enlistment returns
//! - File deleted once every subordinate resource completed
//! - Leftover files turned back into in-doubt resources on recovery
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Host Transaction Manager                        │
//! │   (outflow / completion)        (periodic recovery sweep)    │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │  RegistryStore  │                │ InDoubtRecovery │
//!   │ (one per txn)   │                │   (callback)    │
//!   └───┬─────────┬───┘                └────────┬────────┘
//!       │         │                             │
//!       │         ▼                             ▼
//!       │  ┌──────────────┐            ┌─────────────────┐
//!       │  │RegistryState │◄───────────│ RecoveryScanner │
//!       │  │ open ids     │            └────────┬────────┘
//!       │  │ in-doubt list│                     │
//!       │  └──────────────┘                     │
//!       ▼                                       ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │          {base_dir}/xa-recovery/{hex xid}            │
//!   └─────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod xid;

pub mod registry;
pub mod recovery;
pub mod recovery_log;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RegistryError, Result, XaErrorCode};
pub use config::{Config, SyncMode};
pub use xid::Xid;
pub use registry::{NodeIdentity, RegistryStore, SubordinateResource};
pub use recovery::{XaResourceRecovery, XaResourceRecoveryRegistry};
pub use recovery_log::RecoveryLog;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of xaregistry
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
