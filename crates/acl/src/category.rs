//! The two supported permission categories and the scope tag that selects
//! between a baseline and a machine-wide ceiling.

use std::fmt;

/// Which stored ACL family an entry belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PermissionCategory {
    /// Call-class permissions: who may call into a running server.
    Access,
    /// Activation-class permissions: who may launch or activate a server.
    Launch,
    /// The registry-key configuration ACL. Listed for completeness; every
    /// ACE operation rejects it.
    Config,
}

impl fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Access => "Access",
            Self::Launch => "Launch",
            Self::Config => "Config",
        })
    }
}

/// Which stored variant of a category an entry belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PermissionScope {
    /// Not applicable: per-application ACLs carry no scope distinction.
    None,
    /// The machine-wide inherited baseline.
    Default,
    /// The machine-wide ceiling ("restriction") that caps every grant.
    Limits,
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "None",
            Self::Default => "Default",
            Self::Limits => "Limits",
        })
    }
}
