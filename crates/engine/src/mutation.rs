//! Read-modify-write mutation of one stored ACL.
//!
//! Every operation is a full round trip: read the blob (bootstrapping the
//! built-in default when none is stored), edit the decoded DACL in memory,
//! encode, write the whole blob back, then re-read and confirm the edit
//! actually landed. No lock is held across the round trip; callers racing
//! on the same key must serialize externally.

use acl::{
    AccessControlEntry, PermissionCategory, PermissionScope, PrincipalResolver, compose, decompose,
};
use descriptor::{AccessRight, EntryType, RawAce, SecurityDescriptor, Sid};
use tracing::{debug, info};

use crate::error::EngineError;
use crate::key::{AclTarget, PermissionKey, PermissionState};
use crate::store::PermissionStore;

/// A decoded view of one stored ACL at a moment in time.
#[derive(Clone, Debug, serde::Serialize)]
pub struct AclSnapshot {
    /// The target the ACL belongs to.
    pub target: AclTarget,
    /// Category of the ACL.
    pub category: PermissionCategory,
    /// Scope of the ACL.
    pub scope: PermissionScope,
    /// Whether an override blob was actually stored.
    pub state: PermissionState,
    /// The decomposed entries. For a `UsesDefault` key these are the
    /// bootstrap descriptor's entries, not an inherited machine ACL.
    pub entries: Vec<AccessControlEntry>,
}

/// Mutates stored ACLs through a [`PermissionStore`], resolving principals
/// through a [`PrincipalResolver`].
pub struct PermissionEditor<'a, S, R> {
    store: &'a mut S,
    resolver: R,
    host: Option<String>,
}

impl<'a, S: PermissionStore, R: PrincipalResolver> PermissionEditor<'a, S, R> {
    /// Wraps `store`, resolving display names through `resolver`.
    pub fn new(store: &'a mut S, resolver: R) -> Self {
        Self {
            store,
            resolver,
            host: None,
        }
    }

    /// Directs principal resolution at `host` instead of the local machine.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Whether `target` stores an override for `(category, scope)` or falls
    /// through to the machine default.
    pub fn permission_state(
        &self,
        target: &AclTarget,
        category: PermissionCategory,
        scope: PermissionScope,
    ) -> Result<PermissionState, EngineError> {
        let key = PermissionKey::new(target, category, scope)?;
        let stored = self.store.read_blob(target, key)?;
        Ok(match stored {
            Some(bytes) if !bytes.is_empty() => PermissionState::Customized,
            _ => PermissionState::UsesDefault,
        })
    }

    /// Reads and decomposes one stored ACL.
    pub fn snapshot(
        &self,
        target: &AclTarget,
        category: PermissionCategory,
        scope: PermissionScope,
    ) -> Result<AclSnapshot, EngineError> {
        let key = PermissionKey::new(target, category, scope)?;
        let (sd, state) = self.load_descriptor(target, key)?;
        let entries = decompose(
            sd.dacl.as_deref().unwrap_or(&[]),
            category,
            scope,
            &self.resolver,
            self.host.as_deref(),
        )?;
        Ok(AclSnapshot {
            target: target.clone(),
            category,
            scope,
            state,
            entries,
        })
    }

    /// The entries that actually govern an application for `category`:
    /// its own override when one is stored, otherwise the machine Default
    /// ACL it inherits.
    pub fn effective_entries(
        &self,
        app_id: &str,
        category: PermissionCategory,
    ) -> Result<Vec<AccessControlEntry>, EngineError> {
        let target = AclTarget::Application(app_id.to_owned());
        let own = self.snapshot(&target, category, PermissionScope::None)?;
        if own.state == PermissionState::Customized {
            return Ok(own.entries);
        }
        let inherited = self.snapshot(&AclTarget::Machine, category, PermissionScope::Default)?;
        Ok(inherited.entries)
    }

    /// Grants or denies `rights` to `principal`, replacing any existing
    /// entry of the same polarity for that principal.
    ///
    /// Confirmed against a re-read: the stored blob must contain exactly
    /// one entry for the principal with the written polarity and mask, or
    /// the call fails with [`EngineError::WriteNotConfirmed`].
    pub fn set_rights(
        &mut self,
        target: &AclTarget,
        category: PermissionCategory,
        scope: PermissionScope,
        principal: &Sid,
        rights: &[AccessRight],
        grant: EntryType,
    ) -> Result<(), EngineError> {
        let key = PermissionKey::new(target, category, scope)?;
        let mask = compose(rights, category)?;

        let (mut sd, _) = self.load_descriptor(target, key)?;
        let mut dacl = sd.dacl.take().unwrap_or_default();
        let before = dacl.len();
        dacl.retain(|ace| !(ace.sid == *principal && ace.entry_type() == Some(grant)));
        if before != dacl.len() {
            debug!(%principal, replaced = before - dacl.len(), "replacing existing entry");
        }
        dacl.push(RawAce::new(grant, principal.clone(), mask));
        sd.dacl = Some(dacl);

        let bytes = sd.encode()?;
        self.store.write_blob(target, key, &bytes)?;

        let (confirmed, _) = self.load_descriptor(target, key)?;
        let matching: Vec<_> = confirmed
            .dacl
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter(|ace| ace.sid == *principal && ace.entry_type() == Some(grant))
            .collect();
        if matching.len() != 1 || matching[0].mask != mask {
            return Err(EngineError::WriteNotConfirmed {
                principal: self.display_name(principal),
                category,
                scope,
            });
        }
        info!(%target, %category, %scope, %principal, %mask, "rights written and confirmed");
        Ok(())
    }

    /// Removes every entry for `principal`, allow and deny alike.
    ///
    /// Confirmed against a re-read: no entry for the principal may remain,
    /// or the call fails with [`EngineError::RemovalNotConfirmed`].
    pub fn remove_rights(
        &mut self,
        target: &AclTarget,
        category: PermissionCategory,
        scope: PermissionScope,
        principal: &Sid,
    ) -> Result<(), EngineError> {
        let key = PermissionKey::new(target, category, scope)?;

        let (mut sd, _) = self.load_descriptor(target, key)?;
        let mut dacl = sd.dacl.take().unwrap_or_default();
        dacl.retain(|ace| ace.sid != *principal);
        sd.dacl = Some(dacl);

        let bytes = sd.encode()?;
        self.store.write_blob(target, key, &bytes)?;

        let (confirmed, _) = self.load_descriptor(target, key)?;
        let survivors = confirmed
            .dacl
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter(|ace| ace.sid == *principal)
            .count();
        if survivors != 0 {
            return Err(EngineError::RemovalNotConfirmed {
                principal: self.display_name(principal),
                category,
                scope,
            });
        }
        info!(%target, %category, %scope, %principal, "rights removed and confirmed");
        Ok(())
    }

    /// Deletes an application's override for `category`, returning it to
    /// the machine default. Succeeds as a no-op when no override is stored.
    pub fn reset_to_default(
        &mut self,
        app_id: &str,
        category: PermissionCategory,
    ) -> Result<(), EngineError> {
        let target = AclTarget::Application(app_id.to_owned());
        let key = PermissionKey::new(&target, category, PermissionScope::None)?;
        self.store.delete_blob(&target, key)?;
        info!(%target, %category, "override deleted, back to machine default");
        Ok(())
    }

    fn load_descriptor(
        &self,
        target: &AclTarget,
        key: PermissionKey,
    ) -> Result<(SecurityDescriptor, PermissionState), EngineError> {
        match self.store.read_blob(target, key)? {
            Some(bytes) if !bytes.is_empty() => Ok((
                SecurityDescriptor::decode(&bytes)?,
                PermissionState::Customized,
            )),
            _ => Ok((
                SecurityDescriptor::bootstrap_default(),
                PermissionState::UsesDefault,
            )),
        }
    }

    fn display_name(&self, principal: &Sid) -> String {
        self.resolver
            .resolve_name(principal, self.host.as_deref())
            .unwrap_or_else(|| principal.to_string())
    }
}
