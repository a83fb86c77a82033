//! Mask-to-flag decomposition and the reverse rights-to-mask composition.

use descriptor::{AccessMask, AccessRight, RawAce};
use tracing::debug;

use crate::category::{PermissionCategory, PermissionScope};
use crate::entry::AccessControlEntry;
use crate::error::AclError;
use crate::resolve::PrincipalResolver;

/// Expands raw DACL entries into typed entries for `category`.
///
/// Each principal is resolved through `resolver` against `host`; a failed
/// resolution falls back to the canonical SID string and is never an error.
/// Entries whose type byte is neither allow nor deny (audit entries and the
/// like) carry no grant polarity and are skipped.
///
/// Fails only for the Config category, which has no flag vocabulary.
pub fn decompose<R: PrincipalResolver>(
    raw: &[RawAce],
    category: PermissionCategory,
    scope: PermissionScope,
    resolver: &R,
    host: Option<&str>,
) -> Result<Vec<AccessControlEntry>, AclError> {
    if category == PermissionCategory::Config {
        return Err(AclError::UnsupportedCategory(category));
    }

    let mut entries = Vec::with_capacity(raw.len());
    for ace in raw {
        let Some(grant) = ace.entry_type() else {
            debug!(type_code = ace.type_code(), sid = %ace.sid, "skipping non-grant entry");
            continue;
        };
        let display_user = resolver.resolve_name(&ace.sid, host).unwrap_or_else(|| {
            debug!(sid = %ace.sid, "principal not resolved, using SID string");
            ace.sid.to_string()
        });

        let entry = match category {
            PermissionCategory::Access => {
                let (local, remote) = access_flags(ace.mask);
                AccessControlEntry::access(ace.sid.clone(), display_user, grant, scope, local, remote)
            }
            PermissionCategory::Launch => {
                let (ll, rl, la, ra) = launch_flags(ace.mask);
                AccessControlEntry::launch(
                    ace.sid.clone(),
                    display_user,
                    grant,
                    scope,
                    ll,
                    rl,
                    la,
                    ra,
                )
            }
            PermissionCategory::Config => unreachable!("rejected above"),
        };
        entries.push(entry);
    }
    Ok(entries)
}

/// Folds a rights list into the wire mask for `category`.
///
/// The Execute bit is always included; the authorization subsystem treats a
/// mask without it as granting nothing. Fails for the Config category.
pub fn compose(
    rights: &[AccessRight],
    category: PermissionCategory,
) -> Result<AccessMask, AclError> {
    if category == PermissionCategory::Config {
        return Err(AclError::UnsupportedCategory(category));
    }

    let mut mask = AccessMask::from_rights(&[AccessRight::Execute]);
    let strip_activation = category == PermissionCategory::Launch
        && rights
            .iter()
            .any(|r| matches!(r, AccessRight::ActivateLocal | AccessRight::ActivateRemote));
    for &right in rights {
        // TODO(product): activation rights in a Launch request are dropped
        // here, matching the administration tool this replaces. That looks
        // inverted (it discards exactly what the caller asked for); awaiting
        // confirmation before changing the stored masks.
        if strip_activation
            && matches!(right, AccessRight::ActivateLocal | AccessRight::ActivateRemote)
        {
            continue;
        }
        mask |= right;
    }
    Ok(mask)
}

/// Local/remote access flags for a call-class mask.
fn access_flags(mask: AccessMask) -> (bool, bool) {
    let execute = mask.contains(AccessRight::Execute);
    let local = mask.contains(AccessRight::ExecuteLocal)
        || (execute && !mask.contains(AccessRight::ExecuteRemote));
    let remote = mask.contains(AccessRight::ExecuteRemote)
        || (execute && !mask.contains(AccessRight::ExecuteLocal));
    (local, remote)
}

/// Launch and activation flags for an activation-class mask.
///
/// A bare Execute bit means "everything": each flag also turns on when
/// Execute is set and none of the other three specific rights are.
fn launch_flags(mask: AccessMask) -> (bool, bool, bool, bool) {
    let execute = mask.contains(AccessRight::Execute);
    let el = mask.contains(AccessRight::ExecuteLocal);
    let er = mask.contains(AccessRight::ExecuteRemote);
    let al = mask.contains(AccessRight::ActivateLocal);
    let ar = mask.contains(AccessRight::ActivateRemote);

    let local_launch = el || (execute && !er && !ar && !al);
    let remote_launch = er || (execute && !el && !ar && !al);
    let local_activation = al || (execute && !el && !er && !ar);
    let remote_activation = ar || (execute && !el && !er && !al);
    (local_launch, remote_launch, local_activation, remote_activation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::NullResolver;
    use descriptor::{EntryType, Sid};

    fn mask(rights: &[AccessRight]) -> AccessMask {
        AccessMask::from_rights(rights)
    }

    #[test]
    fn bare_execute_grants_all_launch_flags() {
        assert_eq!(
            launch_flags(mask(&[AccessRight::Execute])),
            (true, true, true, true)
        );
    }

    #[test]
    fn activation_bit_narrows_execute_inference() {
        // Execute|ActivateLocal: the explicit activation bit wins and the
        // Execute-alone inference no longer applies to the other flags.
        assert_eq!(
            launch_flags(mask(&[AccessRight::Execute, AccessRight::ActivateLocal])),
            (false, false, true, false)
        );
    }

    #[test]
    fn explicit_launch_bits_are_independent() {
        assert_eq!(
            launch_flags(mask(&[AccessRight::ExecuteLocal, AccessRight::ActivateRemote])),
            (true, false, false, true)
        );
    }

    #[test]
    fn access_flags_follow_execute_sides() {
        assert_eq!(access_flags(mask(&[AccessRight::Execute])), (true, true));
        assert_eq!(
            access_flags(mask(&[AccessRight::Execute, AccessRight::ExecuteRemote])),
            (false, true)
        );
        assert_eq!(access_flags(mask(&[AccessRight::ExecuteLocal])), (true, false));
    }

    #[test]
    fn decompose_falls_back_to_sid_string() {
        let raw = vec![RawAce::allow(
            Sid::local_system(),
            mask(&[AccessRight::Execute, AccessRight::ExecuteLocal]),
        )];
        let entries = decompose(
            &raw,
            PermissionCategory::Access,
            PermissionScope::Default,
            &NullResolver,
            None,
        )
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].display_user, "S-1-5-18");
        assert_eq!(entries[0].grant, EntryType::Allow);
        assert_eq!(entries[0].local_access, Some(true));
        assert_eq!(entries[0].remote_access, Some(false));
        assert_eq!(entries[0].local_launch, None);
    }

    #[test]
    fn decompose_uses_resolver_names() {
        let resolver = |sid: &Sid, _host: Option<&str>| {
            (*sid == Sid::builtin_administrators()).then(|| "BUILTIN\\Administrators".to_owned())
        };
        let raw = vec![RawAce::deny(
            Sid::builtin_administrators(),
            mask(&[AccessRight::ExecuteRemote]),
        )];
        let entries = decompose(
            &raw,
            PermissionCategory::Access,
            PermissionScope::Limits,
            &resolver,
            Some("host01"),
        )
        .unwrap();
        assert_eq!(entries[0].display_user, "BUILTIN\\Administrators");
        assert_eq!(entries[0].grant, EntryType::Deny);
    }

    #[test]
    fn decompose_skips_audit_entries() {
        let mut audit = RawAce::allow(Sid::well_known_self(), mask(&[AccessRight::Execute]));
        audit.kind = descriptor::AceKind::Unknown(0x02);
        let raw = vec![
            audit,
            RawAce::allow(Sid::well_known_self(), mask(&[AccessRight::Execute])),
        ];
        let entries = decompose(
            &raw,
            PermissionCategory::Launch,
            PermissionScope::None,
            &NullResolver,
            None,
        )
        .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn decompose_rejects_config() {
        assert_eq!(
            decompose(
                &[],
                PermissionCategory::Config,
                PermissionScope::None,
                &NullResolver,
                None
            ),
            Err(AclError::UnsupportedCategory(PermissionCategory::Config))
        );
    }

    #[test]
    fn compose_always_seeds_execute() {
        let mask = compose(&[], PermissionCategory::Access).unwrap();
        assert_eq!(mask.bits(), AccessRight::Execute.bit());
    }

    #[test]
    fn compose_strips_activation_for_launch() {
        let mask = compose(
            &[AccessRight::ExecuteLocal, AccessRight::ActivateLocal],
            PermissionCategory::Launch,
        )
        .unwrap();
        assert!(mask.contains(AccessRight::Execute));
        assert!(mask.contains(AccessRight::ExecuteLocal));
        assert!(!mask.contains(AccessRight::ActivateLocal));
    }

    #[test]
    fn compose_keeps_activation_for_access() {
        let mask = compose(
            &[AccessRight::ActivateLocal],
            PermissionCategory::Access,
        )
        .unwrap();
        assert!(mask.contains(AccessRight::ActivateLocal));
    }

    #[test]
    fn compose_rejects_config() {
        assert_eq!(
            compose(&[AccessRight::Execute], PermissionCategory::Config),
            Err(AclError::UnsupportedCategory(PermissionCategory::Config))
        );
    }

    #[test]
    fn decompose_then_compose_preserves_effective_mask() {
        let original = mask(&[AccessRight::Execute, AccessRight::ExecuteLocal]);
        let raw = vec![RawAce::allow(Sid::well_known_self(), original)];
        let entries = decompose(
            &raw,
            PermissionCategory::Access,
            PermissionScope::Default,
            &NullResolver,
            None,
        )
        .unwrap();
        let recomposed =
            compose(&entries[0].effective_rights(), PermissionCategory::Access).unwrap();
        assert_eq!(recomposed, original);
    }
}
