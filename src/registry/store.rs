//! Registry store
//!
//! One durable log file per transaction, listing the locators of every
//! subordinate resource the transaction outflowed.
//!
//! ## Lifecycle
//! ```text
//!  create ──► add_resource* ──► remove_resource (count → 0) ──► file deleted
//!                  │
//!                  └─ crash ──► scanner ──► recover ──► in-doubt handles
//! ```
//!
//! A live store holds its file open and exclusively locked until the last
//! resource is released. Dropping a live store without releasing its
//! resources leaves the file behind, exactly as a crash would.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fs2::FileExt;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SyncMode;
use crate::error::{RegistryError, Result, XaErrorCode};
use crate::xid::Xid;

use super::record::{encode_record, parse_records};
use super::resource::SubordinateResource;
use super::state::RegistryState;

/// How a store is backed on disk
enum Backing {
    /// Created for an active transaction of this process. The handle is
    /// taken (closed) when the last resource is released.
    Live {
        file: Mutex<Option<File>>,
        sync_mode: SyncMode,
    },

    /// Rebuilt from a file left behind by a previous process
    Recovered,
}

/// Durable record of the subordinate resources of one transaction
///
/// ## Concurrency:
/// - Appends are serialized by the Mutex around the file handle
/// - `resource_count` is atomic; exactly one release observes the
///   transition to zero and deletes the file
pub struct RegistryStore {
    /// Hex rendering of the transaction id (also the file name)
    id: String,

    /// Full path of the registry file
    path: PathBuf,

    backing: Backing,

    /// Resources recorded and not yet released
    resource_count: AtomicUsize,

    state: Arc<RegistryState>,
}

impl RegistryStore {
    /// Create the registry file for a new transaction
    ///
    /// The id is claimed in the open registry set before the file exists,
    /// so a concurrent recovery scan never takes the fresh file for an
    /// abandoned one. The file must not already exist.
    pub fn create(
        recovery_dir: &Path,
        xid: &Xid,
        sync_mode: SyncMode,
        state: Arc<RegistryState>,
    ) -> Result<Arc<Self>> {
        let id = xid.to_hex_string();
        let path = recovery_dir.join(&id);

        if !state.open_registries().insert(&id) {
            return Err(RegistryError::CreateFailed {
                path,
                source: io::Error::new(
                    ErrorKind::AlreadyExists,
                    "a registry is already open for this transaction",
                ),
            });
        }

        let file = match open_locked(recovery_dir, &path) {
            Ok(file) => file,
            Err(source) => {
                state.open_registries().remove(&id);
                return Err(RegistryError::CreateFailed { path, source });
            }
        };

        info!(path = %path.display(), "Recovery file created");

        Ok(Arc::new(Self {
            id,
            path,
            backing: Backing::Live {
                file: Mutex::new(Some(file)),
                sync_mode,
            },
            resource_count: AtomicUsize::new(0),
            state,
        }))
    }

    /// Rebuild an abandoned registry and register its resources as in doubt
    ///
    /// The caller must already hold `id` in the open registry set. Returns
    /// `Ok(None)` when there is nothing to recover: the file vanished before
    /// it could be read, or it holds no locators (in which case it is
    /// deleted unless another owner still holds its lock). A malformed file
    /// registers nothing.
    pub(crate) fn recover(
        recovery_dir: &Path,
        id: &str,
        node_name: &str,
        state: Arc<RegistryState>,
    ) -> Result<Option<Arc<Self>>> {
        let path = recovery_dir.join(id);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Recovery file vanished before it was read");
                return Ok(None);
            }
            Err(source) => return Err(RegistryError::ReadFailed { path, source }),
        };

        let locators = parse_records(&content, &path)?;

        if locators.is_empty() {
            delete_if_unlocked(&path);
            return Ok(None);
        }

        let store = Arc::new(Self {
            id: id.to_string(),
            path,
            backing: Backing::Recovered,
            resource_count: AtomicUsize::new(locators.len()),
            state: Arc::clone(&state),
        });

        let resources: Vec<Arc<SubordinateResource>> = locators
            .into_iter()
            .map(|location| {
                info!(
                    locator = %location,
                    path = %store.path.display(),
                    "Recovered in-doubt resource from recovery file"
                );
                Arc::new(SubordinateResource::new(location, node_name, Arc::clone(&store)))
            })
            .collect();

        state.in_doubt().extend(resources);

        Ok(Some(store))
    }

    /// Record a subordinate resource
    ///
    /// For a live store the locator is appended and forced to disk before
    /// this returns. The count is incremented even if the write fails: the
    /// caller must treat that failure as fatal to the transaction.
    pub fn add_resource(&self, locator: &Url) -> Result<()> {
        let outcome = match &self.backing {
            Backing::Live { file, sync_mode } => self.append(file, *sync_mode, locator),
            Backing::Recovered => Ok(()),
        };

        self.resource_count.fetch_add(1, Ordering::SeqCst);
        outcome?;

        debug!(locator = %locator, path = %self.path.display(), "Resource added to recovery file");
        Ok(())
    }

    /// Release a resource that completed normally
    ///
    /// When the last resource is released the file is closed and deleted and
    /// the id leaves the open registry set. The resource is always dropped
    /// from the in-doubt list, whether or not it was ever flagged.
    pub fn remove_resource(&self, resource: &SubordinateResource) -> Result<()> {
        let previous = self
            .resource_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| count.checked_sub(1));

        let outcome = match previous {
            Ok(1) => self.delete(resource),
            Ok(_) => Ok(()),
            Err(_) => {
                warn!(
                    path = %self.path.display(),
                    resource = %resource,
                    "Released more resources than were recorded"
                );
                Ok(())
            }
        };

        self.state.in_doubt().remove(resource);
        outcome
    }

    /// Flag a resource that failed to complete prepare, rollback or forget
    pub fn in_doubt_resource(&self, resource: Arc<SubordinateResource>) {
        debug!(resource = %resource, "Resource flagged in doubt");
        self.state.in_doubt().push(resource);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Hex transaction id, also the file name
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Decode the transaction id, if the file name is a valid rendering
    pub fn xid(&self) -> Option<Xid> {
        Xid::from_hex(&self.id).ok()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn resource_count(&self) -> usize {
        self.resource_count.load(Ordering::SeqCst)
    }

    /// True if this store was created by this process for an active
    /// transaction, false if it was rebuilt by recovery
    pub fn is_live(&self) -> bool {
        matches!(self.backing, Backing::Live { .. })
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn append(&self, file: &Mutex<Option<File>>, sync_mode: SyncMode, locator: &Url) -> Result<()> {
        let mut guard = file.lock();

        let result = match guard.as_mut() {
            Some(file) => file
                .write_all(encode_record(locator).as_bytes())
                .and_then(|()| match sync_mode {
                    SyncMode::Full => file.sync_all(),
                    SyncMode::Data => file.sync_data(),
                }),
            None => Err(io::Error::new(
                ErrorKind::Other,
                "recovery file already closed",
            )),
        };

        result.map_err(|source| RegistryError::AppendFailed {
            locator: locator.clone(),
            path: self.path.clone(),
            source,
        })
    }

    /// Close (if live) and delete the file. Called exactly once.
    fn delete(&self, resource: &SubordinateResource) -> Result<()> {
        if let Backing::Live { file, .. } = &self.backing {
            // Closing the handle releases the advisory lock
            drop(file.lock().take());
        }

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Recovery file was already gone");
            }
            Err(source) => {
                return Err(RegistryError::DeleteFailed {
                    code: XaErrorCode::RmErr,
                    path: self.path.clone(),
                    resource: resource.to_string(),
                    source,
                });
            }
        }

        self.state.open_registries().remove(&self.id);
        info!(path = %self.path.display(), "Recovery file deleted");
        Ok(())
    }
}

impl fmt::Debug for RegistryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryStore")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("live", &self.is_live())
            .field("resource_count", &self.resource_count())
            .finish()
    }
}

/// Delete an empty leftover file, unless a live registry (possibly in
/// another process) still holds its lock. The lock is held across the unlink.
fn delete_if_unlocked(path: &Path) {
    let file = match OpenOptions::new().read(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to open empty recovery file");
            return;
        }
    };

    if file.try_lock_exclusive().is_err() {
        debug!(path = %path.display(), "Empty recovery file is locked by a live registry");
        return;
    }

    match fs::remove_file(path) {
        Ok(()) => info!(path = %path.display(), "Deleted empty recovery file"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete empty recovery file"),
    }
}

/// Create `path` (which must not exist) and lock it exclusively
fn open_locked(recovery_dir: &Path, path: &Path) -> io::Result<File> {
    fs::create_dir_all(recovery_dir)?;

    let file = OpenOptions::new().append(true).create_new(true).open(path)?;

    if let Err(e) = file.try_lock_exclusive() {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e);
    }

    Ok(file)
}
