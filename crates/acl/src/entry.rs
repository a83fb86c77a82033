//! The typed access-control entry.

use std::fmt;
use std::hash::{Hash, Hasher};

use descriptor::{AccessRight, EntryType, Sid};

use crate::category::{PermissionCategory, PermissionScope};

/// One decomposed access-control entry: a principal, a grant-or-deny tag,
/// the category and scope it was read from, and six tri-state capability
/// flags. A flag is `None` when it does not apply to the entry's category,
/// `Some(bool)` otherwise.
///
/// Equality compares the display name case-insensitively together with the
/// grant type, category, scope, and all six flags. The hash covers only the
/// lowercased display name plus the grant/category/scope tags, so entries
/// that differ only in flags land in the same bucket and are separated by
/// the full comparison.
#[derive(Clone, Debug, serde::Serialize)]
pub struct AccessControlEntry {
    /// Binary identifier of the principal.
    #[serde(skip)]
    pub sid: Sid,
    /// Resolved account name, or the canonical SID string when resolution
    /// was unavailable.
    pub display_user: String,
    /// Whether this entry grants or denies its rights.
    pub grant: EntryType,
    /// Category the entry was decomposed from.
    pub category: PermissionCategory,
    /// Scope the entry was decomposed from.
    pub scope: PermissionScope,
    /// Permission to call into a running server from the same machine.
    pub local_access: Option<bool>,
    /// Permission to call into a running server from the network.
    pub remote_access: Option<bool>,
    /// Permission to launch a server process locally.
    pub local_launch: Option<bool>,
    /// Permission to launch a server process remotely.
    pub remote_launch: Option<bool>,
    /// Permission to activate objects in a local server.
    pub local_activation: Option<bool>,
    /// Permission to activate objects in a remote server.
    pub remote_activation: Option<bool>,
}

impl AccessControlEntry {
    /// Creates a call-class entry with the launch/activation flags cleared.
    pub fn access(
        sid: Sid,
        display_user: String,
        grant: EntryType,
        scope: PermissionScope,
        local_access: bool,
        remote_access: bool,
    ) -> Self {
        Self {
            sid,
            display_user,
            grant,
            category: PermissionCategory::Access,
            scope,
            local_access: Some(local_access),
            remote_access: Some(remote_access),
            local_launch: None,
            remote_launch: None,
            local_activation: None,
            remote_activation: None,
        }
    }

    /// Creates an activation-class entry with the access flags cleared.
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        sid: Sid,
        display_user: String,
        grant: EntryType,
        scope: PermissionScope,
        local_launch: bool,
        remote_launch: bool,
        local_activation: bool,
        remote_activation: bool,
    ) -> Self {
        Self {
            sid,
            display_user,
            grant,
            category: PermissionCategory::Launch,
            scope,
            local_access: None,
            remote_access: None,
            local_launch: Some(local_launch),
            remote_launch: Some(remote_launch),
            local_activation: Some(local_activation),
            remote_activation: Some(remote_activation),
        }
    }

    /// Projects the set flags onto the elementary rights they stand for.
    ///
    /// Activation flags map one-to-one; a true local flag of either access
    /// or launch kind contributes Execute plus ExecuteLocal, and likewise
    /// for the remote side. Each right appears at most once.
    pub fn effective_rights(&self) -> Vec<AccessRight> {
        let mut rights = Vec::new();
        let mut push = |r: AccessRight, v: &mut Vec<AccessRight>| {
            if !v.contains(&r) {
                v.push(r);
            }
        };
        if self.local_activation == Some(true) {
            push(AccessRight::ActivateLocal, &mut rights);
        }
        if self.remote_activation == Some(true) {
            push(AccessRight::ActivateRemote, &mut rights);
        }
        if self.local_access == Some(true) || self.local_launch == Some(true) {
            push(AccessRight::Execute, &mut rights);
            push(AccessRight::ExecuteLocal, &mut rights);
        }
        if self.remote_access == Some(true) || self.remote_launch == Some(true) {
            push(AccessRight::Execute, &mut rights);
            push(AccessRight::ExecuteRemote, &mut rights);
        }
        rights
    }
}

impl PartialEq for AccessControlEntry {
    fn eq(&self, other: &Self) -> bool {
        self.display_user.eq_ignore_ascii_case(&other.display_user)
            && self.grant == other.grant
            && self.category == other.category
            && self.scope == other.scope
            && self.local_access == other.local_access
            && self.remote_access == other.remote_access
            && self.local_launch == other.local_launch
            && self.remote_launch == other.remote_launch
            && self.local_activation == other.local_activation
            && self.remote_activation == other.remote_activation
    }
}

impl Eq for AccessControlEntry {}

impl Hash for AccessControlEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.display_user.to_ascii_lowercase().hash(state);
        self.grant.hash(state);
        self.category.hash(state);
        self.scope.hash(state);
    }
}

impl fmt::Display for AccessControlEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : ", self.display_user)?;
        let rights = self.effective_rights();
        for (i, right) in rights.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(right.name())?;
        }
        Ok(())
    }
}
