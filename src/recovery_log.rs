//! Recovery Log
//!
//! Process-level entry point that ties registries, the shared state and
//! recovery together.
//!
//! ## Responsibilities
//! - Own the recovery directory location and the shared registry state
//! - Create live registries for transactions that outflow resources
//! - Hand out the scanner and the recovery callback for the host manager

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::config::{recovery_dir_for, Config, SyncMode};
use crate::error::{RegistryError, Result};
use crate::recovery::{
    InDoubtRecovery, RecoveryScanner, ScanOutcome, XaResourceRecovery, XaResourceRecoveryRegistry,
};
use crate::registry::{NodeIdentity, RegistryState, RegistryStore, SubordinateResource};
use crate::xid::Xid;

/// Durable registry of outflowed resources for one storage location
///
/// Create one per process at startup and share it as `Arc<RecoveryLog>`.
pub struct RecoveryLog {
    /// Directory holding the registry files. Only changed while no
    /// registry is open.
    recovery_dir: RwLock<PathBuf>,

    sync_mode: SyncMode,

    state: Arc<RegistryState>,

    node: Arc<dyn NodeIdentity>,
}

impl RecoveryLog {
    /// Create a recovery log with fresh shared state
    ///
    /// Nothing is touched on disk until the first registry is created or
    /// the first scan runs.
    pub fn new(config: &Config, node: Arc<dyn NodeIdentity>) -> Arc<Self> {
        Arc::new(Self {
            recovery_dir: RwLock::new(config.recovery_dir()),
            sync_mode: config.sync_mode,
            state: Arc::new(RegistryState::new()),
            node,
        })
    }

    /// Move the recovery directory under `base_dir`
    ///
    /// Refused while any registry is open, since files already written would
    /// no longer be found by recovery.
    pub fn set_relative_to(&self, base_dir: &Path) -> Result<()> {
        let mut dir = self.recovery_dir.write();

        let open = self.state.open_registries().len();
        if open > 0 {
            return Err(RegistryError::Config(format!(
                "cannot move recovery directory while {} registries are open",
                open
            )));
        }

        *dir = recovery_dir_for(base_dir);
        info!(dir = %dir.display(), "Recovery directory set");
        Ok(())
    }

    /// Create the live registry for a transaction's first outflowed resource
    ///
    /// Callers serialize creation per transaction.
    pub fn create_registry(&self, xid: &Xid) -> Result<Arc<RegistryStore>> {
        let dir = self.recovery_dir.read();
        RegistryStore::create(&dir, xid, self.sync_mode, Arc::clone(&self.state))
    }

    /// Recover registries abandoned by a previous process
    pub fn recover_in_doubt_registries(self: &Arc<Self>) -> Result<ScanOutcome> {
        self.scanner().scan()
    }

    pub fn scanner(self: &Arc<Self>) -> RecoveryScanner {
        RecoveryScanner::new(Arc::clone(self))
    }

    /// The callback to register with the host's recovery registry
    pub fn xa_resource_recovery(self: &Arc<Self>) -> Arc<dyn XaResourceRecovery> {
        Arc::new(InDoubtRecovery::new(self.scanner(), Arc::clone(&self.state)))
    }

    /// Register the recovery callback with the host manager
    pub fn register_recovery(
        self: &Arc<Self>,
        host: &dyn XaResourceRecoveryRegistry,
    ) -> Arc<dyn XaResourceRecovery> {
        let recovery = self.xa_resource_recovery();
        host.add_xa_resource_recovery(Arc::clone(&recovery));
        recovery
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn recovery_dir(&self) -> PathBuf {
        self.recovery_dir.read().clone()
    }

    pub fn state(&self) -> &Arc<RegistryState> {
        &self.state
    }

    pub fn node_name(&self) -> String {
        self.node.node_name()
    }

    /// Snapshot of the in-doubt resources, without scanning
    pub fn in_doubt_resources(&self) -> Box<[Arc<SubordinateResource>]> {
        self.state.in_doubt().snapshot()
    }
}
