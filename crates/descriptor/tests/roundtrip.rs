//! Property tests for the descriptor codec: decode/encode round trips and
//! the canonical-ordering invariants.

use descriptor::{
    ACE_FLAG_INHERITED, AccessMask, AceKind, RawAce, SecurityDescriptor, Sid, canonicalize,
};
use proptest::prelude::*;

fn arb_sid() -> impl Strategy<Value = Sid> {
    (
        1u64..=5,
        prop::collection::vec(any::<u32>(), 1..6),
    )
        .prop_map(|(authority, subs)| Sid::new(authority, subs).expect("within wire limits"))
}

fn arb_ace() -> impl Strategy<Value = RawAce> {
    (arb_sid(), any::<u32>(), any::<bool>(), any::<bool>()).prop_map(
        |(sid, mask, deny, inherited)| {
            let mut ace = if deny {
                RawAce::deny(sid, AccessMask::from_bits(mask))
            } else {
                RawAce::allow(sid, AccessMask::from_bits(mask))
            };
            if inherited {
                ace.flags |= ACE_FLAG_INHERITED;
            }
            ace
        },
    )
}

fn arb_dacl() -> impl Strategy<Value = Vec<RawAce>> {
    prop::collection::vec(arb_ace(), 0..12)
}

proptest! {
    #[test]
    fn decode_encode_identity_on_canonical_dacls(dacl in arb_dacl()) {
        let canonical = canonicalize(dacl).expect("allow/deny entries always bucket");
        let descriptor = SecurityDescriptor {
            owner: Some(Sid::builtin_administrators()),
            group: Some(Sid::builtin_administrators()),
            dacl: Some(canonical.clone()),
        };
        let blob = descriptor.encode().expect("encode");
        let decoded = SecurityDescriptor::decode(&blob).expect("decode");
        prop_assert_eq!(decoded.dacl.as_deref(), Some(canonical.as_slice()));

        // A canonical DACL re-encodes to the identical byte sequence.
        prop_assert_eq!(decoded.encode().expect("re-encode"), blob);
    }

    #[test]
    fn canonicalize_is_idempotent_and_loss_free(dacl in arb_dacl()) {
        let once = canonicalize(dacl.clone()).expect("bucketable");
        prop_assert_eq!(once.len(), dacl.len());
        let twice = canonicalize(once.clone()).expect("bucketable");
        prop_assert_eq!(&twice, &once);
    }

    #[test]
    fn canonical_buckets_are_strictly_ordered(dacl in arb_dacl()) {
        fn bucket(entry: &RawAce) -> u8 {
            if entry.is_inherited() {
                return 4;
            }
            match entry.kind {
                AceKind::Deny => 0,
                AceKind::DenyObject(_) => 1,
                AceKind::Allow => 2,
                AceKind::AllowObject(_) => 3,
                AceKind::Unknown(_) => u8::MAX,
            }
        }

        let out = canonicalize(dacl).expect("bucketable");
        let buckets: Vec<u8> = out.iter().map(bucket).collect();
        prop_assert!(buckets.windows(2).all(|w| w[0] <= w[1]));
    }
}
