#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! Wire codec for the self-relative binary security descriptor consumed by
//! the DCOM authorization subsystem.
//!
//! The crate is split into small modules mirroring the on-disk layout of the
//! blob: [`sid`] handles the binary security-identifier records, [`rights`]
//! defines the five elementary DCOM access bits, [`ace`] models a single
//! access-control entry, and [`codec`] assembles and disassembles whole
//! descriptors including the canonical DACL ordering enforced before any
//! write-back.
//!
//! The blob produced here is read back by the real OS subsystem, so every
//! encoder is byte-for-byte faithful to the published layout: a 20-byte
//! descriptor header with offsets to owner SID, group SID, and the
//! discretionary ACL; an 8-byte ACL header; and 4-byte ACE headers carrying
//! type, flags, size, access mask, and the trustee SID.
//!
//! # Examples
//!
//! Decode a descriptor, inspect the DACL, and re-encode it:
//!
//! ```
//! use descriptor::SecurityDescriptor;
//!
//! let blob = SecurityDescriptor::bootstrap_default().encode().expect("encode default");
//! let parsed = SecurityDescriptor::decode(&blob).expect("decode default");
//! assert_eq!(parsed.dacl.as_ref().map(Vec::len), Some(3));
//! ```

mod ace;
mod codec;
mod error;
mod rights;
mod sid;

pub use ace::{
    ACE_FLAG_INHERITED, ACE_TYPE_ACCESS_ALLOWED, ACE_TYPE_ACCESS_ALLOWED_OBJECT,
    ACE_TYPE_ACCESS_DENIED, ACE_TYPE_ACCESS_DENIED_OBJECT, AceKind, EntryType, ObjectAceData,
    RawAce,
};
pub use codec::{
    DESCRIPTOR_HEADER_LEN, SE_DACL_PRESENT, SE_SELF_RELATIVE, SecurityDescriptor, canonicalize,
};
pub use error::DescriptorError;
pub use rights::{AccessMask, AccessRight};
pub use sid::Sid;
