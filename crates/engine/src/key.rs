//! Addressing of stored ACLs: which target, which value name.

use std::fmt;

use acl::{PermissionCategory, PermissionScope};

use crate::error::EngineError;

/// What a stored ACL belongs to: the machine as a whole, or one registered
/// application id.
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Serialize)]
pub enum AclTarget {
    /// The machine-wide defaults and limits.
    Machine,
    /// One application, identified by its catalog id string.
    Application(String),
}

impl fmt::Display for AclTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Machine => f.write_str("machine"),
            Self::Application(id) => write!(f, "application {id}"),
        }
    }
}

/// A validated (category, scope) pair naming one of the six stored ACLs.
///
/// Machine targets carry four keys (Access and Launch, each at Default and
/// Limits scope); application targets carry two (Access and Launch, no
/// scope distinction). Construction rejects every other combination.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize)]
pub struct PermissionKey {
    category: PermissionCategory,
    scope: PermissionScope,
}

impl PermissionKey {
    /// Validates `(category, scope)` against `target` and builds the key.
    pub fn new(
        target: &AclTarget,
        category: PermissionCategory,
        scope: PermissionScope,
    ) -> Result<Self, EngineError> {
        if category == PermissionCategory::Config {
            return Err(acl::AclError::UnsupportedCategory(category).into());
        }
        let valid = match target {
            AclTarget::Machine => {
                matches!(scope, PermissionScope::Default | PermissionScope::Limits)
            }
            AclTarget::Application(_) => scope == PermissionScope::None,
        };
        if !valid {
            return Err(EngineError::UnsupportedKey { category, scope });
        }
        Ok(Self { category, scope })
    }

    /// The category half of the key.
    pub const fn category(self) -> PermissionCategory {
        self.category
    }

    /// The scope half of the key.
    pub const fn scope(self) -> PermissionScope {
        self.scope
    }

    /// The store value name this key maps to under `target`.
    pub fn value_name(self, target: &AclTarget) -> &'static str {
        match (target, self.category, self.scope) {
            (AclTarget::Machine, PermissionCategory::Access, PermissionScope::Default) => {
                "DefaultAccessPermission"
            }
            (AclTarget::Machine, PermissionCategory::Access, PermissionScope::Limits) => {
                "MachineAccessRestriction"
            }
            (AclTarget::Machine, PermissionCategory::Launch, PermissionScope::Default) => {
                "DefaultLaunchPermission"
            }
            (AclTarget::Machine, PermissionCategory::Launch, PermissionScope::Limits) => {
                "MachineLaunchRestriction"
            }
            (AclTarget::Application(_), PermissionCategory::Access, _) => "AccessPermission",
            (AclTarget::Application(_), PermissionCategory::Launch, _) => "LaunchPermission",
            // new() admits no other combination
            _ => unreachable!("invalid permission key"),
        }
    }
}

/// Whether a stored ACL is an explicit override or falls through to the
/// machine default.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub enum PermissionState {
    /// No override is stored; the machine Default ACL applies.
    UsesDefault,
    /// An explicit blob is stored for this key.
    Customized,
}
