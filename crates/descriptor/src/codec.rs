//! Whole-descriptor decode/encode and the canonical DACL ordering.
//!
//! The self-relative layout is a 20-byte header (revision, control word,
//! then byte offsets to the owner SID, group SID, system ACL, and
//! discretionary ACL), followed by the referenced records anywhere in the
//! remainder of the blob. Decoding honors the offsets wherever they point;
//! encoding always emits DACL, owner, group in that order directly after
//! the header.

use crate::ace::{AceKind, RawAce};
use crate::error::DescriptorError;
use crate::rights::AccessMask;
use crate::sid::Sid;

/// Size of the fixed self-relative descriptor header.
pub const DESCRIPTOR_HEADER_LEN: usize = 20;

/// Control bit: a discretionary ACL is present.
pub const SE_DACL_PRESENT: u16 = 0x0004;
/// Control bit: the descriptor is in self-relative form.
pub const SE_SELF_RELATIVE: u16 = 0x8000;

const SD_REVISION: u8 = 1;
const ACL_HEADER_LEN: usize = 8;
const ACL_REVISION: u8 = 2;
const ACL_REVISION_DS: u8 = 4;

/// Access mask granted to SELF and BUILTIN\Administrators in the bootstrap
/// descriptor (`CCDCLC` in descriptor-definition-language terms).
const BOOTSTRAP_FULL_MASK: u32 = 0x7;
/// Access mask granted to SYSTEM in the bootstrap descriptor (`CCDC`).
const BOOTSTRAP_SYSTEM_MASK: u32 = 0x3;

/// A decoded security descriptor: owner, group, and discretionary ACL.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SecurityDescriptor {
    /// Owner SID, when the header references one.
    pub owner: Option<Sid>,
    /// Primary group SID, when the header references one.
    pub group: Option<Sid>,
    /// The discretionary ACL. `None` means the descriptor carries no DACL
    /// at all, which the authorization subsystem treats as "grant everyone".
    pub dacl: Option<Vec<RawAce>>,
}

impl SecurityDescriptor {
    /// The fixed built-in default descriptor, used whenever a stored ACL
    /// does not exist yet.
    ///
    /// Textual form: `O:BAG:BAD:(A;;CCDCLC;;;PS)(A;;CCDC;;;SY)(A;;CCDCLC;;;BA)`
    /// — owner and group BUILTIN\Administrators, with allow entries for
    /// SELF, SYSTEM, and BUILTIN\Administrators.
    pub fn bootstrap_default() -> Self {
        Self {
            owner: Some(Sid::builtin_administrators()),
            group: Some(Sid::builtin_administrators()),
            dacl: Some(vec![
                RawAce::allow(
                    Sid::well_known_self(),
                    AccessMask::from_bits(BOOTSTRAP_FULL_MASK),
                ),
                RawAce::allow(
                    Sid::local_system(),
                    AccessMask::from_bits(BOOTSTRAP_SYSTEM_MASK),
                ),
                RawAce::allow(
                    Sid::builtin_administrators(),
                    AccessMask::from_bits(BOOTSTRAP_FULL_MASK),
                ),
            ]),
        }
    }

    /// Decodes a self-relative security descriptor blob.
    pub fn decode(bytes: &[u8]) -> Result<Self, DescriptorError> {
        if bytes.len() < DESCRIPTOR_HEADER_LEN {
            return Err(DescriptorError::malformed(format!(
                "descriptor is {} bytes, header alone needs {DESCRIPTOR_HEADER_LEN}",
                bytes.len()
            )));
        }
        let revision = bytes[0];
        if revision != SD_REVISION {
            return Err(DescriptorError::malformed(format!(
                "unsupported descriptor revision {revision}"
            )));
        }
        let control = u16::from_le_bytes([bytes[2], bytes[3]]);
        let owner_offset = read_offset(bytes, 4);
        let group_offset = read_offset(bytes, 8);
        let dacl_offset = read_offset(bytes, 16);

        let owner = decode_sid_at(bytes, owner_offset, "owner")?;
        let group = decode_sid_at(bytes, group_offset, "group")?;
        let dacl = if control & SE_DACL_PRESENT != 0 && dacl_offset != 0 {
            Some(decode_acl_at(bytes, dacl_offset)?)
        } else {
            None
        };

        Ok(Self { owner, group, dacl })
    }

    /// Encodes this descriptor into its self-relative binary form.
    ///
    /// The DACL is canonicalized first; encoding fails rather than persist
    /// an ordering that would drop an entry, and a zero-length result is
    /// rejected as [`DescriptorError::EmptyEncoding`].
    pub fn encode(&self) -> Result<Vec<u8>, DescriptorError> {
        let dacl = match &self.dacl {
            Some(entries) => Some(canonicalize(entries.clone())?),
            None => None,
        };

        let mut out = vec![0u8; DESCRIPTOR_HEADER_LEN];
        out[0] = SD_REVISION;
        let mut control = SE_SELF_RELATIVE;

        if let Some(entries) = &dacl {
            control |= SE_DACL_PRESENT;
            let offset = out.len() as u32;
            out[16..20].copy_from_slice(&offset.to_le_bytes());
            encode_acl_into(entries, &mut out)?;
        }
        if let Some(owner) = &self.owner {
            let offset = out.len() as u32;
            out[4..8].copy_from_slice(&offset.to_le_bytes());
            owner.encode_into(&mut out);
        }
        if let Some(group) = &self.group {
            let offset = out.len() as u32;
            out[8..12].copy_from_slice(&offset.to_le_bytes());
            group.encode_into(&mut out);
        }
        out[2..4].copy_from_slice(&control.to_le_bytes());

        if out.is_empty() {
            return Err(DescriptorError::EmptyEncoding);
        }
        Ok(out)
    }
}

/// Reorders a DACL into canonical form.
///
/// Entries partition into five buckets emitted in this fixed order:
/// access-denied on the object, access-denied on a child or property,
/// access-allowed on the object, access-allowed on a child or property,
/// then all inherited entries. Relative order within a bucket is preserved.
///
/// Fails with [`DescriptorError::CanonicalizationDataLoss`] when an entry
/// fits no bucket or the partition would change the entry count; a DACL is
/// never silently truncated.
pub fn canonicalize(entries: Vec<RawAce>) -> Result<Vec<RawAce>, DescriptorError> {
    let input_len = entries.len();
    let mut deny = Vec::new();
    let mut deny_object = Vec::new();
    let mut allow = Vec::new();
    let mut allow_object = Vec::new();
    let mut inherited = Vec::new();

    for (index, entry) in entries.into_iter().enumerate() {
        if entry.is_inherited() {
            inherited.push(entry);
            continue;
        }
        match entry.kind {
            AceKind::Deny => deny.push(entry),
            AceKind::DenyObject(_) => deny_object.push(entry),
            AceKind::Allow => allow.push(entry),
            AceKind::AllowObject(_) => allow_object.push(entry),
            AceKind::Unknown(code) => {
                return Err(DescriptorError::CanonicalizationDataLoss(format!(
                    "entry {index} for {} has unrecognized ACE type {code:#04x}",
                    entry.sid
                )));
            }
        }
    }

    let mut out = deny;
    out.append(&mut deny_object);
    out.append(&mut allow);
    out.append(&mut allow_object);
    out.append(&mut inherited);

    if out.len() != input_len {
        return Err(DescriptorError::CanonicalizationDataLoss(format!(
            "partition produced {} entries from {input_len}",
            out.len()
        )));
    }
    Ok(out)
}

fn read_offset(bytes: &[u8], at: usize) -> usize {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}

fn decode_sid_at(
    bytes: &[u8],
    offset: usize,
    which: &str,
) -> Result<Option<Sid>, DescriptorError> {
    if offset == 0 {
        return Ok(None);
    }
    if offset >= bytes.len() {
        return Err(DescriptorError::malformed(format!(
            "{which} SID offset {offset} is outside the {} byte blob",
            bytes.len()
        )));
    }
    let (sid, _) = Sid::decode(&bytes[offset..])?;
    Ok(Some(sid))
}

fn decode_acl_at(bytes: &[u8], offset: usize) -> Result<Vec<RawAce>, DescriptorError> {
    if offset + ACL_HEADER_LEN > bytes.len() {
        return Err(DescriptorError::malformed(format!(
            "DACL offset {offset} leaves no room for the 8-byte ACL header"
        )));
    }
    let header = &bytes[offset..];
    let revision = header[0];
    if revision != ACL_REVISION && revision != ACL_REVISION_DS {
        return Err(DescriptorError::malformed(format!(
            "unsupported ACL revision {revision}"
        )));
    }
    let declared = usize::from(u16::from_le_bytes([header[2], header[3]]));
    let count = usize::from(u16::from_le_bytes([header[4], header[5]]));
    if declared < ACL_HEADER_LEN || offset + declared > bytes.len() {
        return Err(DescriptorError::malformed(format!(
            "DACL declares {declared} bytes, {} available after offset {offset}",
            bytes.len() - offset
        )));
    }

    let mut entries = Vec::with_capacity(count);
    let mut at = ACL_HEADER_LEN;
    for index in 0..count {
        if at >= declared {
            return Err(DescriptorError::malformed(format!(
                "DACL declares {count} entries but the data ends after {index}"
            )));
        }
        let (entry, consumed) = RawAce::decode(&header[at..declared])?;
        entries.push(entry);
        at += consumed;
    }
    Ok(entries)
}

fn encode_acl_into(entries: &[RawAce], out: &mut Vec<u8>) -> Result<(), DescriptorError> {
    let start = out.len();
    let revision = if entries
        .iter()
        .any(|e| matches!(e.kind, AceKind::AllowObject(_) | AceKind::DenyObject(_)))
    {
        ACL_REVISION_DS
    } else {
        ACL_REVISION
    };
    out.push(revision);
    out.push(0);
    out.extend_from_slice(&[0, 0]); // size backfilled below
    let count = u16::try_from(entries.len()).map_err(|_| {
        DescriptorError::malformed(format!("DACL entry count {} exceeds u16", entries.len()))
    })?;
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&[0, 0]);

    for entry in entries {
        entry.encode_into(out);
    }

    let size = u16::try_from(out.len() - start).map_err(|_| {
        DescriptorError::malformed(format!(
            "DACL occupies {} bytes, limit is u16",
            out.len() - start
        ))
    })?;
    out[start + 2..start + 4].copy_from_slice(&size.to_le_bytes());
    Ok(())
}
