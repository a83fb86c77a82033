#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! Mutation and synchronization of stored DCOM permission ACLs, plus the
//! machine-wide configuration values that sit next to them.
//!
//! The engine talks to the host catalog only through the [`PermissionStore`]
//! trait. Every mutation is a blocking read-modify-write round trip over a
//! whole descriptor blob, confirmed by re-reading the store afterwards;
//! nothing is cached across operations and nothing is retried internally.
//!
//! - [`PermissionEditor`] adds, replaces, and removes one principal's
//!   rights within a stored ACL, and resets per-application overrides.
//! - [`sync`] compares two ACLs as multisets and copies one onto the
//!   other, aggregating per-entry failures instead of stopping early.
//! - [`MachineConfig`] batches the machine-wide settings behind an
//!   explicit load/commit cycle.

mod config;
mod error;
mod key;
mod mutation;
mod store;
pub mod sync;

pub use config::MachineConfig;
pub use error::{EngineError, EntryFailure};
pub use key::{AclTarget, PermissionKey, PermissionState};
pub use mutation::{AclSnapshot, PermissionEditor};
pub use store::{MemoryStore, PermissionStore, SettingValue};
