//! Shared registry state
//!
//! Process-wide bookkeeping shared by every registry, the scanner and the
//! recovery callback. One `RegistryState` is created per recovery log and
//! handed out as `Arc<RegistryState>`; it is never reset while the log is in
//! use.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::resource::SubordinateResource;

/// Shared state: the open registry ids and the in-doubt resources
///
/// ## Concurrency:
/// - Each container has its own Mutex
/// - Operations on one container are linearizable
/// - No atomicity across the two containers: a resource may briefly be in
///   neither or both during a transition
#[derive(Default)]
pub struct RegistryState {
    open: OpenRegistrySet,
    in_doubt: InDoubtResources,
}

impl RegistryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of registries currently owned by this process
    pub fn open_registries(&self) -> &OpenRegistrySet {
        &self.open
    }

    /// Resources needing recovery attention
    pub fn in_doubt(&self) -> &InDoubtResources {
        &self.in_doubt
    }
}

// =============================================================================
// Open Registry Set
// =============================================================================

/// Ids of registry files that belong to this process
///
/// A live registry is inserted before its file is created; a recovered one
/// is inserted by the scanner before its file is read. Either is removed once
/// the file has been deleted.
#[derive(Default)]
pub struct OpenRegistrySet {
    ids: Mutex<HashSet<String>>,
}

impl OpenRegistrySet {
    /// Claim an id. Returns false if it was already claimed.
    pub fn insert(&self, id: &str) -> bool {
        self.ids.lock().insert(id.to_string())
    }

    /// Release an id. Returns false if it was not claimed.
    pub fn remove(&self, id: &str) -> bool {
        self.ids.lock().remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }

    /// Sorted copy of the claimed ids
    pub fn snapshot(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.lock().iter().cloned().collect();
        ids.sort();
        ids
    }
}

// =============================================================================
// In-Doubt Resources
// =============================================================================

/// Resources that need to be driven to completion by recovery
///
/// Entries are compared by identity. Duplicates are kept.
#[derive(Default)]
pub struct InDoubtResources {
    resources: Mutex<Vec<Arc<SubordinateResource>>>,
}

impl InDoubtResources {
    pub fn push(&self, resource: Arc<SubordinateResource>) {
        self.resources.lock().push(resource);
    }

    /// Append several resources under a single lock acquisition
    pub fn extend(&self, resources: impl IntoIterator<Item = Arc<SubordinateResource>>) {
        self.resources.lock().extend(resources);
    }

    /// Remove every occurrence of `resource`. Returns how many were removed.
    pub fn remove(&self, resource: &SubordinateResource) -> usize {
        let mut resources = self.resources.lock();
        let before = resources.len();
        resources.retain(|r| !std::ptr::eq(Arc::as_ptr(r), resource));
        before - resources.len()
    }

    pub fn contains(&self, resource: &SubordinateResource) -> bool {
        self.resources
            .lock()
            .iter()
            .any(|r| std::ptr::eq(Arc::as_ptr(r), resource))
    }

    pub fn len(&self) -> usize {
        self.resources.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.lock().is_empty()
    }

    /// Fixed-size copy of the current contents, in insertion order
    pub fn snapshot(&self) -> Box<[Arc<SubordinateResource>]> {
        self.resources.lock().iter().cloned().collect()
    }
}
