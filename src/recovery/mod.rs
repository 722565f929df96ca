//! Recovery Module
//!
//! Turns registry files left behind by a crash back into in-doubt resources.
//!
//! ## Responsibilities
//! - List the recovery directory and skip registries owned by this process
//! - Rebuild each abandoned registry and register its resources as in doubt
//! - Expose the in-doubt resources to the host's recovery sweep, never
//!   failing past that boundary

mod callback;
mod scanner;

pub use callback::{InDoubtRecovery, XaResourceRecovery, XaResourceRecoveryRegistry};
pub use scanner::{list_registry_files, RecoveryScanner, ScanOutcome};
