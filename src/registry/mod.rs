//! Registry Module
//!
//! Per-transaction durable logs of outflowed subordinate resources.
//!
//! ## Responsibilities
//! - Create and exclusively lock one file per transaction
//! - Append each locator and force it to disk before returning
//! - Delete the file once every resource has been released
//! - Track open registries and in-doubt resources for recovery
//!
//! ## File Format
//! ```text
//! {recovery_dir}/{hex xid}
//! ┌─────────────────────────────┐
//! │ xa://node2/resA\n           │
//! │ xa://node2/resB\n           │
//! │ ...                         │
//! └─────────────────────────────┘
//! ```
//! Append-only text, one locator URL per line. No header, no checksum.

mod record;
mod resource;
mod state;
mod store;

pub use record::{encode_record, parse_records};
pub use resource::{NodeIdentity, SubordinateResource};
pub use state::{InDoubtResources, OpenRegistrySet, RegistryState};
pub use store::RegistryStore;
