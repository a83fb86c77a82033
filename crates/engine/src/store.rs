//! The store collaborator contract and an in-memory implementation.
//!
//! The real store is the host's configuration catalog; the engine only ever
//! sees it through this trait. Every operation is a synchronous round trip
//! and may fail with [`EngineError::NotFound`] or
//! [`EngineError::Unauthorized`].

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::EngineError;
use crate::key::{AclTarget, PermissionKey};

/// One named machine configuration value.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub enum SettingValue {
    /// A string value, used for the yes/no flags.
    Text(String),
    /// A 32-bit numeric value, used for the level settings.
    Number(u32),
}

/// Synchronous access to stored descriptor blobs and machine settings.
pub trait PermissionStore {
    /// Reads the blob stored for `key` under `target`, or `None` when no
    /// override exists.
    fn read_blob(
        &self,
        target: &AclTarget,
        key: PermissionKey,
    ) -> Result<Option<Vec<u8>>, EngineError>;

    /// Replaces the blob stored for `key` under `target`.
    fn write_blob(
        &mut self,
        target: &AclTarget,
        key: PermissionKey,
        bytes: &[u8],
    ) -> Result<(), EngineError>;

    /// Deletes the stored blob. Deleting an absent blob succeeds.
    fn delete_blob(&mut self, target: &AclTarget, key: PermissionKey) -> Result<(), EngineError>;

    /// Reads one named machine setting, or `None` when unset.
    fn read_setting(&self, name: &str) -> Result<Option<SettingValue>, EngineError>;

    /// Writes one named machine setting.
    fn write_setting(&mut self, name: &str, value: SettingValue) -> Result<(), EngineError>;
}

/// An in-memory store, for tests and offline what-if runs.
///
/// Application targets must be registered before use; reads and writes
/// against an unregistered id fail with [`EngineError::NotFound`], matching
/// the real catalog's behavior for a missing application key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: FxHashMap<(AclTarget, &'static str), Vec<u8>>,
    settings: FxHashMap<String, SettingValue>,
    applications: FxHashSet<String>,
    read_only: bool,
}

impl MemoryStore {
    /// An empty store with no registered applications.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an application id so its two ACL keys become addressable.
    pub fn register_application(&mut self, id: impl Into<String>) {
        self.applications.insert(id.into());
    }

    /// Makes every mutation fail with [`EngineError::Unauthorized`].
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn check_target(&self, target: &AclTarget) -> Result<(), EngineError> {
        match target {
            AclTarget::Machine => Ok(()),
            AclTarget::Application(id) => {
                if self.applications.contains(id) {
                    Ok(())
                } else {
                    Err(EngineError::NotFound(format!("application {id}")))
                }
            }
        }
    }

    fn check_writable(&self) -> Result<(), EngineError> {
        if self.read_only {
            Err(EngineError::Unauthorized(
                "store is opened read-only".to_owned(),
            ))
        } else {
            Ok(())
        }
    }
}

impl PermissionStore for MemoryStore {
    fn read_blob(
        &self,
        target: &AclTarget,
        key: PermissionKey,
    ) -> Result<Option<Vec<u8>>, EngineError> {
        self.check_target(target)?;
        Ok(self
            .blobs
            .get(&(target.clone(), key.value_name(target)))
            .cloned())
    }

    fn write_blob(
        &mut self,
        target: &AclTarget,
        key: PermissionKey,
        bytes: &[u8],
    ) -> Result<(), EngineError> {
        self.check_target(target)?;
        self.check_writable()?;
        self.blobs
            .insert((target.clone(), key.value_name(target)), bytes.to_vec());
        Ok(())
    }

    fn delete_blob(&mut self, target: &AclTarget, key: PermissionKey) -> Result<(), EngineError> {
        self.check_target(target)?;
        self.check_writable()?;
        self.blobs.remove(&(target.clone(), key.value_name(target)));
        Ok(())
    }

    fn read_setting(&self, name: &str) -> Result<Option<SettingValue>, EngineError> {
        Ok(self.settings.get(name).cloned())
    }

    fn write_setting(&mut self, name: &str, value: SettingValue) -> Result<(), EngineError> {
        self.check_writable()?;
        self.settings.insert(name.to_owned(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acl::{PermissionCategory, PermissionScope};

    #[test]
    fn unregistered_application_is_not_found() {
        let store = MemoryStore::new();
        let target = AclTarget::Application("{missing}".into());
        let key =
            PermissionKey::new(&target, PermissionCategory::Access, PermissionScope::None).unwrap();
        assert!(matches!(
            store.read_blob(&target, key),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn read_only_store_rejects_writes() {
        let mut store = MemoryStore::new();
        store.set_read_only(true);
        let key = PermissionKey::new(
            &AclTarget::Machine,
            PermissionCategory::Access,
            PermissionScope::Default,
        )
        .unwrap();
        assert!(matches!(
            store.write_blob(&AclTarget::Machine, key, &[1, 2, 3]),
            Err(EngineError::Unauthorized(_))
        ));
    }

    #[test]
    fn delete_of_absent_blob_succeeds() {
        let mut store = MemoryStore::new();
        let key = PermissionKey::new(
            &AclTarget::Machine,
            PermissionCategory::Launch,
            PermissionScope::Limits,
        )
        .unwrap();
        assert!(store.delete_blob(&AclTarget::Machine, key).is_ok());
    }
}
