//! Error type for ACE-level operations.

use crate::category::PermissionCategory;

/// Errors produced while translating between raw masks and typed entries.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum AclError {
    /// The requested category does not support ACE operations. Only the
    /// Access and Launch categories carry editable ACLs.
    #[error("the {0} category does not support access-control-entry operations")]
    UnsupportedCategory(PermissionCategory),
}
