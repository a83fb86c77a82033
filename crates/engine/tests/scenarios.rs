//! End-to-end mutation and synchronization flows against the in-memory
//! store.

use acl::{NullResolver, PermissionCategory, PermissionScope};
use descriptor::{AccessRight, EntryType, Sid};
use engine::sync::{self, CopyOutcome};
use engine::{
    AclTarget, EngineError, MemoryStore, PermissionEditor, PermissionKey, PermissionState,
    PermissionStore,
};

fn operator() -> Sid {
    "S-1-5-21-100-200-300-1013".parse().unwrap()
}

#[test]
fn first_grant_on_empty_store_yields_single_entry() {
    let mut store = MemoryStore::new();
    let mut editor = PermissionEditor::new(&mut store, NullResolver);
    let target = AclTarget::Machine;
    let p = operator();

    editor
        .set_rights(
            &target,
            PermissionCategory::Access,
            PermissionScope::Default,
            &p,
            &[AccessRight::ExecuteLocal],
            EntryType::Allow,
        )
        .unwrap();

    let snap = editor
        .snapshot(
            &target,
            PermissionCategory::Access,
            PermissionScope::Default,
        )
        .unwrap();
    assert_eq!(snap.state, PermissionState::Customized);

    let mine: Vec<_> = snap.entries.iter().filter(|e| e.sid == p).collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].grant, EntryType::Allow);
    assert_eq!(mine[0].local_access, Some(true));
    assert_eq!(mine[0].remote_access, Some(false));
    // Bootstrap entries for SELF, SYSTEM, and Administrators survive the
    // write alongside the new grant.
    assert_eq!(snap.entries.len(), 4);
}

#[test]
fn removal_clears_allow_and_deny_entries() {
    let mut store = MemoryStore::new();
    let mut editor = PermissionEditor::new(&mut store, NullResolver);
    let target = AclTarget::Machine;
    let p = operator();

    for grant in [EntryType::Allow, EntryType::Deny] {
        editor
            .set_rights(
                &target,
                PermissionCategory::Launch,
                PermissionScope::Default,
                &p,
                &[AccessRight::ExecuteLocal, AccessRight::ExecuteRemote],
                grant,
            )
            .unwrap();
    }

    editor
        .remove_rights(
            &target,
            PermissionCategory::Launch,
            PermissionScope::Default,
            &p,
        )
        .unwrap();

    let snap = editor
        .snapshot(
            &target,
            PermissionCategory::Launch,
            PermissionScope::Default,
        )
        .unwrap();
    assert!(snap.entries.iter().all(|e| e.sid != p));
}

#[test]
fn copy_from_default_source_resets_destination() {
    let mut store = MemoryStore::new();
    store.register_application("{src}");
    store.register_application("{dst}");
    let mut editor = PermissionEditor::new(&mut store, NullResolver);
    let dst = AclTarget::Application("{dst}".into());
    let p = operator();

    // Customize the destination so the reset is observable.
    editor
        .set_rights(
            &dst,
            PermissionCategory::Access,
            PermissionScope::None,
            &p,
            &[AccessRight::Execute],
            EntryType::Allow,
        )
        .unwrap();

    let from = editor
        .snapshot(
            &AclTarget::Application("{src}".into()),
            PermissionCategory::Access,
            PermissionScope::None,
        )
        .unwrap();
    assert_eq!(from.state, PermissionState::UsesDefault);

    let outcome = sync::copy(&mut editor, &from, &dst, PermissionScope::None, true).unwrap();
    assert!(outcome.reset_to_default);
    assert_eq!(
        editor
            .permission_state(&dst, PermissionCategory::Access, PermissionScope::None)
            .unwrap(),
        PermissionState::UsesDefault
    );
}

#[test]
fn overwrite_copy_brings_destination_in_sync() {
    let mut store = MemoryStore::new();
    store.register_application("{src}");
    store.register_application("{dst}");
    let mut editor = PermissionEditor::new(&mut store, NullResolver);
    let src = AclTarget::Application("{src}".into());
    let dst = AclTarget::Application("{dst}".into());
    let p = operator();
    let q: Sid = "S-1-5-21-100-200-300-2044".parse().unwrap();

    editor
        .set_rights(
            &src,
            PermissionCategory::Launch,
            PermissionScope::None,
            &p,
            &[AccessRight::ExecuteLocal],
            EntryType::Allow,
        )
        .unwrap();
    // Destination holds an entry the source does not know.
    editor
        .set_rights(
            &dst,
            PermissionCategory::Launch,
            PermissionScope::None,
            &q,
            &[AccessRight::ExecuteRemote],
            EntryType::Deny,
        )
        .unwrap();

    let from = editor
        .snapshot(&src, PermissionCategory::Launch, PermissionScope::None)
        .unwrap();
    let CopyOutcome {
        added,
        removed,
        in_sync,
        ..
    } = sync::copy(&mut editor, &from, &dst, PermissionScope::None, true).unwrap();

    assert!(added >= 1);
    assert!(removed >= 1);
    assert!(in_sync);

    let to = editor
        .snapshot(&dst, PermissionCategory::Launch, PermissionScope::None)
        .unwrap();
    assert!(sync::equals(&from.entries, &to.entries));
    assert!(sync::mismatched(&from.entries, &to.entries).is_empty());
}

#[test]
fn denied_copy_reports_every_failed_entry() {
    let mut store = MemoryStore::new();
    store.register_application("{src}");
    store.register_application("{dst}");
    let src = AclTarget::Application("{src}".into());
    let dst = AclTarget::Application("{dst}".into());
    let p = operator();

    {
        let mut editor = PermissionEditor::new(&mut store, NullResolver);
        editor
            .set_rights(
                &src,
                PermissionCategory::Access,
                PermissionScope::None,
                &p,
                &[AccessRight::ExecuteLocal],
                EntryType::Allow,
            )
            .unwrap();
    }
    store.set_read_only(true);

    let mut editor = PermissionEditor::new(&mut store, NullResolver);
    let from = editor
        .snapshot(&src, PermissionCategory::Access, PermissionScope::None)
        .unwrap();
    let err = sync::copy(&mut editor, &from, &dst, PermissionScope::None, false).unwrap_err();

    let EngineError::Aggregate(failures) = err else {
        panic!("expected an aggregate failure, got {err}");
    };
    // Only the operator's grant is missing from the destination; the
    // bootstrap entries already match.
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].user, p.to_string());
    assert_eq!(failures[0].category, PermissionCategory::Access);
    assert_eq!(failures[0].scope, PermissionScope::None);
    assert!(
        failures
            .iter()
            .all(|f| matches!(*f.error, EngineError::Unauthorized(_)))
    );
}

#[test]
fn unbucketable_entry_blocks_the_write() {
    let mut store = MemoryStore::new();
    let target = AclTarget::Machine;
    let key = PermissionKey::new(
        &target,
        PermissionCategory::Access,
        PermissionScope::Default,
    )
    .unwrap();

    // Store a descriptor whose first DACL entry carries an audit type
    // byte. Decoding preserves it; canonicalization cannot bucket it.
    let mut bytes = descriptor::SecurityDescriptor::bootstrap_default()
        .encode()
        .unwrap();
    bytes[descriptor::DESCRIPTOR_HEADER_LEN + 8] = 0x02;
    store.write_blob(&target, key, &bytes).unwrap();

    let mut editor = PermissionEditor::new(&mut store, NullResolver);
    let result = editor.set_rights(
        &target,
        PermissionCategory::Access,
        PermissionScope::Default,
        &operator(),
        &[AccessRight::ExecuteLocal],
        EntryType::Allow,
    );
    assert!(matches!(
        result,
        Err(EngineError::Descriptor(
            descriptor::DescriptorError::CanonicalizationDataLoss(_)
        ))
    ));

    // The stored blob is untouched.
    let stored = store.read_blob(&target, key).unwrap().unwrap();
    assert_eq!(stored, bytes);
}

#[test]
fn snapshot_serializes_for_export() {
    let mut store = MemoryStore::new();
    let mut editor = PermissionEditor::new(&mut store, NullResolver);
    editor
        .set_rights(
            &AclTarget::Machine,
            PermissionCategory::Access,
            PermissionScope::Limits,
            &operator(),
            &[AccessRight::Execute],
            EntryType::Allow,
        )
        .unwrap();

    let snap = editor
        .snapshot(
            &AclTarget::Machine,
            PermissionCategory::Access,
            PermissionScope::Limits,
        )
        .unwrap();
    let json = serde_json::to_string(&snap).unwrap();
    assert!(json.contains("\"Customized\""));
    assert!(json.contains("\"Access\""));
}
