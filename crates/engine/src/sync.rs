//! Multiset comparison of two ACLs and the copy operation built on it.
//!
//! An ACL is treated as a multiset of entries: duplicates count. The
//! comparisons are pure; only [`copy`] mutates, one entry at a time,
//! attempting every entry before reporting an aggregate failure.

use acl::{AccessControlEntry, PermissionScope, PrincipalResolver};
use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::error::{EngineError, EntryFailure};
use crate::key::{AclTarget, PermissionState};
use crate::mutation::{AclSnapshot, PermissionEditor};
use crate::store::PermissionStore;

/// Whether `a` and `b` hold the same entries with the same multiplicities.
///
/// Symmetric and reflexive; two empty ACLs are equal.
pub fn equals(a: &[AccessControlEntry], b: &[AccessControlEntry]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut counts: FxHashMap<&AccessControlEntry, usize> = FxHashMap::default();
    for entry in a {
        *counts.entry(entry).or_insert(0) += 1;
    }
    for entry in b {
        match counts.get_mut(entry) {
            Some(count) if *count > 0 => *count -= 1,
            _ => return false,
        }
    }
    true
}

/// The entries of `a` that `b` does not fully account for, in `a`'s order.
///
/// Each occurrence in `b` cancels one matching occurrence in `a`; whatever
/// remains is returned. `mismatched(b, a)` yields the symmetric difference
/// in the other direction. Neither input is mutated.
pub fn mismatched(
    a: &[AccessControlEntry],
    b: &[AccessControlEntry],
) -> Vec<AccessControlEntry> {
    let mut available: FxHashMap<&AccessControlEntry, usize> = FxHashMap::default();
    for entry in b {
        *available.entry(entry).or_insert(0) += 1;
    }
    let mut out = Vec::new();
    for entry in a {
        match available.get_mut(entry) {
            Some(count) if *count > 0 => *count -= 1,
            _ => out.push(entry.clone()),
        }
    }
    out
}

/// Result of a [`copy`] run.
#[derive(Clone, Debug, serde::Serialize)]
pub struct CopyOutcome {
    /// Entries written onto the destination.
    pub added: usize,
    /// Principals removed from the destination (overwrite mode only).
    pub removed: usize,
    /// The destination was returned to the machine default instead of
    /// receiving entries, because the source stores no override.
    pub reset_to_default: bool,
    /// Whether the refreshed destination now equals the source.
    pub in_sync: bool,
}

/// Copies `from`'s entries onto `to`.
///
/// A source in the `UsesDefault` state resets the destination to its
/// default instead of copying concrete entries (application targets only).
/// Otherwise every entry missing from the destination is written; with
/// `overwrite`, principals the source does not know are removed as well.
/// All entries are attempted even after a failure, and the failures are
/// reported together as [`EngineError::Aggregate`]. The destination is
/// re-read afterwards and compared against the source.
pub fn copy<S: PermissionStore, R: PrincipalResolver>(
    editor: &mut PermissionEditor<'_, S, R>,
    from: &AclSnapshot,
    to: &AclTarget,
    to_scope: PermissionScope,
    overwrite: bool,
) -> Result<CopyOutcome, EngineError> {
    let category = from.category;

    if from.state == PermissionState::UsesDefault {
        let AclTarget::Application(id) = to else {
            return Err(EngineError::UnsupportedKey {
                category,
                scope: to_scope,
            });
        };
        editor.reset_to_default(id, category)?;
        info!(%to, %category, "source uses default, destination reset");
        return Ok(CopyOutcome {
            added: 0,
            removed: 0,
            reset_to_default: true,
            in_sync: true,
        });
    }

    // Entry equality includes the scope tag, so re-tag the source entries
    // with the destination's scope before any comparison.
    let expected: Vec<AccessControlEntry> = from
        .entries
        .iter()
        .cloned()
        .map(|mut entry| {
            entry.scope = to_scope;
            entry
        })
        .collect();

    let current = editor.snapshot(to, category, to_scope)?;
    let mut failures = Vec::new();
    let mut added = 0;
    let mut removed = 0;

    for entry in mismatched(&expected, &current.entries) {
        match editor.set_rights(
            to,
            category,
            to_scope,
            &entry.sid,
            &entry.effective_rights(),
            entry.grant,
        ) {
            Ok(()) => added += 1,
            Err(error) => {
                warn!(user = %entry.display_user, %error, "copy: entry not applied");
                failures.push(EntryFailure {
                    user: entry.display_user.clone(),
                    category,
                    scope: to_scope,
                    error: Box::new(error),
                });
            }
        }
    }

    if overwrite {
        for entry in mismatched(&current.entries, &expected) {
            match editor.remove_rights(to, category, to_scope, &entry.sid) {
                Ok(()) => removed += 1,
                Err(error) => {
                    warn!(user = %entry.display_user, %error, "copy: entry not removed");
                    failures.push(EntryFailure {
                        user: entry.display_user.clone(),
                        category,
                        scope: to_scope,
                        error: Box::new(error),
                    });
                }
            }
        }
    }

    if !failures.is_empty() {
        return Err(EngineError::Aggregate(failures));
    }

    let refreshed = editor.snapshot(to, category, to_scope)?;
    let in_sync = equals(&expected, &refreshed.entries);
    info!(%to, %category, added, removed, in_sync, "copy complete");
    Ok(CopyOutcome {
        added,
        removed,
        reset_to_default: false,
        in_sync,
    })
}
