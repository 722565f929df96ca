//! Recovery scanner
//!
//! Finds registry files left behind by a previous process and rebuilds them
//! as recovered registries whose resources become in doubt.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{RegistryError, Result};
use crate::recovery_log::RecoveryLog;
use crate::registry::RegistryStore;

/// Result of one scan
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Registries rebuilt by this scan
    pub recovered: Vec<Arc<RegistryStore>>,

    /// Files that could not be recovered (unreadable or malformed).
    /// They are retried by the next scan.
    pub failures: Vec<RegistryError>,
}

impl ScanOutcome {
    /// Number of in-doubt resources contributed by this scan
    pub fn resources_recovered(&self) -> usize {
        self.recovered.iter().map(|store| store.resource_count()).sum()
    }
}

/// Scans the recovery directory for abandoned registries
#[derive(Clone)]
pub struct RecoveryScanner {
    log: Arc<RecoveryLog>,
}

impl RecoveryScanner {
    pub fn new(log: Arc<RecoveryLog>) -> Self {
        Self { log }
    }

    /// Recover every registry file not owned by this process
    ///
    /// Each candidate is claimed in the open registry set before it is read,
    /// so live registries and registries recovered by an earlier scan are
    /// skipped, and two concurrent scans never recover the same file. A
    /// recovered registry keeps its claim until its last resource is
    /// released. A file that fails to load gives its claim back and
    /// reappears in the next scan.
    pub fn scan(&self) -> Result<ScanOutcome> {
        let dir = self.log.recovery_dir();
        let names = list_registry_files(&dir)?;

        let state = self.log.state();
        let node_name = self.log.node_name();
        let mut outcome = ScanOutcome::default();

        for name in names {
            if !state.open_registries().insert(&name) {
                continue;
            }

            match RegistryStore::recover(&dir, &name, &node_name, Arc::clone(state)) {
                Ok(Some(store)) => outcome.recovered.push(store),
                Ok(None) => {
                    state.open_registries().remove(&name);
                }
                Err(e) => {
                    state.open_registries().remove(&name);
                    outcome.failures.push(e);
                }
            }
        }

        if !outcome.recovered.is_empty() {
            info!(
                registries = outcome.recovered.len(),
                resources = outcome.resources_recovered(),
                "Recovered in-doubt registries"
            );
        }

        Ok(outcome)
    }
}

/// Names of the registry files in `dir`, sorted
///
/// A missing directory has no files. Subdirectories and names that are not
/// valid UTF-8 are skipped.
pub fn list_registry_files(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "Recovery directory does not exist");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(RegistryError::ListFailed {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| RegistryError::ListFailed {
            path: dir.to_path_buf(),
            source,
        })?;

        // Vanished since listing
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!(name = ?raw, "Skipping recovery file with non UTF-8 name"),
        }
    }

    names.sort();
    Ok(names)
}
