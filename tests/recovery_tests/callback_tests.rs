//! Tests for the recovery callback
//!
//! These tests verify:
//! - The callback always returns a snapshot, never an error
//! - Scan failures are swallowed
//! - Registration with the host's recovery registry
//! - Moving the recovery directory only while nothing is open

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;
use url::Url;
use xaregistry::{
    Config, RecoveryLog, RegistryError, SubordinateResource, XaResourceRecovery,
    XaResourceRecoveryRegistry, Xid,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn open_log(base: &Path) -> Arc<RecoveryLog> {
    let config = Config::builder().base_dir(base).build();
    RecoveryLog::new(&config, Arc::new("node1"))
}

fn xid(gtrid: &[u8]) -> Xid {
    Xid::new(0, gtrid.to_vec(), Vec::new()).unwrap()
}

/// Stand-in for the host transaction manager's recovery registry
#[derive(Default)]
struct HostRecoveryRegistry {
    recoveries: Mutex<Vec<Arc<dyn XaResourceRecovery>>>,
}

impl HostRecoveryRegistry {
    /// What the host's periodic sweep does
    fn sweep(&self) -> Vec<Arc<SubordinateResource>> {
        self.recoveries
            .lock()
            .iter()
            .flat_map(|r| r.xa_resources().into_vec())
            .collect()
    }
}

impl XaResourceRecoveryRegistry for HostRecoveryRegistry {
    fn add_xa_resource_recovery(&self, recovery: Arc<dyn XaResourceRecovery>) {
        self.recoveries.lock().push(recovery);
    }

    fn remove_xa_resource_recovery(&self, recovery: &Arc<dyn XaResourceRecovery>) {
        self.recoveries.lock().retain(|r| !Arc::ptr_eq(r, recovery));
    }
}

// =============================================================================
// Snapshot Tests
// =============================================================================

#[test]
fn test_empty_snapshot() {
    let temp = TempDir::new().unwrap();
    let log = open_log(temp.path());

    let resources = log.xa_resource_recovery().xa_resources();

    assert!(resources.is_empty());
}

#[test]
fn test_snapshot_includes_flagged_live_resources() {
    let temp = TempDir::new().unwrap();
    let log = open_log(temp.path());
    let registry = log.create_registry(&xid(b"tx1")).unwrap();
    let res =
        SubordinateResource::enlist(&registry, Url::parse("xa://node2/a").unwrap(), "node1").unwrap();
    res.mark_in_doubt();

    let resources = log.xa_resource_recovery().xa_resources();

    assert_eq!(resources.len(), 1);
    assert!(Arc::ptr_eq(&resources[0], &res));
}

#[test]
fn test_callback_recovers_abandoned_files() {
    let temp = TempDir::new().unwrap();
    {
        let log = open_log(temp.path());
        let registry = log.create_registry(&xid(b"tx1")).unwrap();
        registry.add_resource(&Url::parse("xa://node2/a").unwrap()).unwrap();
    }

    let log = open_log(temp.path());
    let resources = log.xa_resource_recovery().xa_resources();

    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].location().as_str(), "xa://node2/a");
}

// =============================================================================
// Failure Suppression Tests
// =============================================================================

#[test]
fn test_listing_failure_swallowed() {
    let temp = TempDir::new().unwrap();
    let log = open_log(temp.path());
    // Recovery directory path is a regular file: listing it fails
    fs::write(log.recovery_dir(), "not a directory").unwrap();

    assert!(matches!(
        log.recover_in_doubt_registries(),
        Err(RegistryError::ListFailed { .. })
    ));

    let resources = log.xa_resource_recovery().xa_resources();
    assert!(resources.is_empty());
}

#[test]
fn test_malformed_file_swallowed() {
    let temp = TempDir::new().unwrap();
    let log = open_log(temp.path());
    fs::create_dir_all(log.recovery_dir()).unwrap();
    fs::write(log.recovery_dir().join("BAD0"), "not a locator\n").unwrap();
    fs::write(log.recovery_dir().join("GOOD"), "xa://node2/good\n").unwrap();

    let resources = log.xa_resource_recovery().xa_resources();

    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].location().as_str(), "xa://node2/good");
}

// =============================================================================
// Host Registration Tests
// =============================================================================

#[test]
fn test_register_with_host() {
    let temp = TempDir::new().unwrap();
    {
        let log = open_log(temp.path());
        let registry = log.create_registry(&xid(b"tx1")).unwrap();
        registry.add_resource(&Url::parse("xa://node2/a").unwrap()).unwrap();
        registry.add_resource(&Url::parse("xa://node2/b").unwrap()).unwrap();
    }

    let host = HostRecoveryRegistry::default();
    let log = open_log(temp.path());
    let recovery = log.register_recovery(&host);

    let swept = host.sweep();
    assert_eq!(swept.len(), 2);

    // Resolved resources disappear from the next sweep
    for res in &swept {
        res.release().unwrap();
    }
    assert!(host.sweep().is_empty());

    host.remove_xa_resource_recovery(&recovery);
    assert!(host.recoveries.lock().is_empty());
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_set_relative_to_refused_while_open() {
    let temp = TempDir::new().unwrap();
    let log = open_log(temp.path());
    let _registry = log.create_registry(&xid(b"tx1")).unwrap();

    let err = log.set_relative_to(&temp.path().join("elsewhere")).unwrap_err();

    assert!(matches!(err, RegistryError::Config(_)));
    assert_eq!(log.recovery_dir(), temp.path().join("xa-recovery"));
}

#[test]
fn test_set_relative_to_moves_new_registries() {
    let temp = TempDir::new().unwrap();
    let log = open_log(temp.path());
    let base = temp.path().join("elsewhere");

    log.set_relative_to(&base).unwrap();
    let registry = log.create_registry(&xid(b"tx1")).unwrap();

    assert_eq!(log.recovery_dir(), base.join("xa-recovery"));
    assert!(registry.path().starts_with(base.join("xa-recovery")));
    assert!(registry.path().exists());
}
