//! Engine-level error taxonomy.
//!
//! Codec and decomposition failures pass through unchanged; everything the
//! engine adds on top names the principal, category, and scope involved so
//! an operator can re-run a narrower corrective action.

use std::fmt;

use acl::{AclError, PermissionCategory, PermissionScope};
use descriptor::DescriptorError;

/// Errors produced by the mutation and synchronization engines and the
/// machine configuration layer.
#[derive(Clone, Debug, thiserror::Error)]
pub enum EngineError {
    /// The store path or application id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller lacks the privilege to mutate the store.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// No stored ACL exists for this category/scope combination on the
    /// requested target.
    #[error("no stored ACL for category {category} at scope {scope}")]
    UnsupportedKey {
        /// Requested category.
        category: PermissionCategory,
        /// Requested scope.
        scope: PermissionScope,
    },

    /// A codec failure, propagated unchanged.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// A decomposition or composition failure, propagated unchanged.
    #[error(transparent)]
    Acl(#[from] AclError),

    /// The re-read blob does not contain exactly one entry matching the
    /// write that was just performed.
    #[error("write for {principal} ({category}/{scope}) not confirmed by re-read")]
    WriteNotConfirmed {
        /// Display form of the principal that was written.
        principal: String,
        /// Category written.
        category: PermissionCategory,
        /// Scope written.
        scope: PermissionScope,
    },

    /// Entries for the principal survived a removal.
    #[error("removal of {principal} ({category}/{scope}) not confirmed by re-read")]
    RemovalNotConfirmed {
        /// Display form of the principal that was removed.
        principal: String,
        /// Category mutated.
        category: PermissionCategory,
        /// Scope mutated.
        scope: PermissionScope,
    },

    /// A machine configuration value is outside its documented range.
    #[error("invalid value for machine setting {name}: {detail}")]
    InvalidSetting {
        /// Store value name of the offending setting.
        name: &'static str,
        /// What was wrong with it.
        detail: String,
    },

    /// One or more entries failed during a multi-entry copy. Carries every
    /// underlying failure; the copy attempted all entries before reporting.
    #[error("{} entries failed during ACL copy", .0.len())]
    Aggregate(Vec<EntryFailure>),
}

/// One failed entry within an aggregate copy failure.
#[derive(Clone, Debug)]
pub struct EntryFailure {
    /// Display name of the principal whose entry failed.
    pub user: String,
    /// Category being copied.
    pub category: PermissionCategory,
    /// Scope being written on the destination.
    pub scope: PermissionScope,
    /// The underlying failure.
    pub error: Box<EngineError>,
}

impl fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{}): {}",
            self.user, self.category, self.scope, self.error
        )
    }
}
