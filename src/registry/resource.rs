//! Subordinate resource handles
//!
//! A `SubordinateResource` is the handle the transaction layer and the
//! recovery sweep use to drive a remote branch to completion. It remembers
//! where the branch lives, which node is processing it, and which registry
//! must be told once it is done.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::Result;

use super::store::RegistryStore;

/// Supplies the identity of the node this process runs as
///
/// Provided by the host transaction manager.
pub trait NodeIdentity: Send + Sync {
    fn node_name(&self) -> String;
}

impl NodeIdentity for String {
    fn node_name(&self) -> String {
        self.clone()
    }
}

impl NodeIdentity for &'static str {
    fn node_name(&self) -> String {
        (*self).to_string()
    }
}

/// An outflowed resource recorded in a registry
pub struct SubordinateResource {
    location: Url,
    node_name: String,
    registry: Arc<RegistryStore>,
}

impl SubordinateResource {
    /// Bind a locator to its registry without touching the file
    pub fn new(location: Url, node_name: impl Into<String>, registry: Arc<RegistryStore>) -> Self {
        Self {
            location,
            node_name: node_name.into(),
            registry,
        }
    }

    /// Durably record `location` in `registry` and return its handle
    ///
    /// This is the outflow path: once it returns `Ok`, the locator survives a
    /// crash.
    pub fn enlist(
        registry: &Arc<RegistryStore>,
        location: Url,
        node_name: impl Into<String>,
    ) -> Result<Arc<Self>> {
        registry.add_resource(&location)?;
        Ok(Arc::new(Self::new(location, node_name, Arc::clone(registry))))
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn registry(&self) -> &Arc<RegistryStore> {
        &self.registry
    }

    /// The branch completed: release it from its registry
    pub fn release(&self) -> Result<()> {
        self.registry.remove_resource(self)
    }

    /// The branch failed to complete: hand it to recovery
    pub fn mark_in_doubt(self: &Arc<Self>) {
        self.registry.in_doubt_resource(Arc::clone(self));
    }
}

impl fmt::Debug for SubordinateResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubordinateResource")
            .field("location", &self.location.as_str())
            .field("node_name", &self.node_name)
            .field("registry", &self.registry.path())
            .finish()
    }
}

impl fmt::Display for SubordinateResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SubordinateResource {{ location: {}, node: {}, registry: {} }}",
            self.location,
            self.node_name,
            self.registry.id()
        )
    }
}
