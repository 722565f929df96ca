//! Recovery callback
//!
//! The hook the host transaction manager calls from its periodic recovery
//! sweep to collect in-doubt subordinate resources.

use std::sync::Arc;

use tracing::{error, warn};

use crate::registry::{RegistryState, SubordinateResource};

use super::scanner::RecoveryScanner;

/// Source of in-doubt resources for a recovery sweep
///
/// Implementations must not panic and have no way to fail: a sweep that
/// cannot make progress simply returns what is already known.
pub trait XaResourceRecovery: Send + Sync {
    fn xa_resources(&self) -> Box<[Arc<SubordinateResource>]>;
}

/// The host transaction manager's registry of recovery sources
pub trait XaResourceRecoveryRegistry {
    fn add_xa_resource_recovery(&self, recovery: Arc<dyn XaResourceRecovery>);

    fn remove_xa_resource_recovery(&self, recovery: &Arc<dyn XaResourceRecovery>);
}

/// Scans for abandoned registries, then reports every in-doubt resource
pub struct InDoubtRecovery {
    scanner: RecoveryScanner,
    state: Arc<RegistryState>,
}

impl InDoubtRecovery {
    pub fn new(scanner: RecoveryScanner, state: Arc<RegistryState>) -> Self {
        Self { scanner, state }
    }
}

impl XaResourceRecovery for InDoubtRecovery {
    fn xa_resources(&self) -> Box<[Arc<SubordinateResource>]> {
        match self.scanner.scan() {
            Ok(outcome) => {
                for failure in &outcome.failures {
                    warn!(error = %failure, "Could not recover registry file");
                }
            }
            Err(e) => {
                error!(error = %e, "Unexpected error during in-doubt resource recovery");
            }
        }

        self.state.in_doubt().snapshot()
    }
}
