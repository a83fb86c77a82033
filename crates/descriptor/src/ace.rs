//! A single raw access-control entry as stored in the DACL.

use crate::error::DescriptorError;
use crate::rights::AccessMask;
use crate::sid::Sid;

/// ACE type byte: access allowed on the object itself.
pub const ACE_TYPE_ACCESS_ALLOWED: u8 = 0x00;
/// ACE type byte: access denied on the object itself.
pub const ACE_TYPE_ACCESS_DENIED: u8 = 0x01;
/// ACE type byte: access allowed on a child object or property.
pub const ACE_TYPE_ACCESS_ALLOWED_OBJECT: u8 = 0x05;
/// ACE type byte: access denied on a child object or property.
pub const ACE_TYPE_ACCESS_DENIED_OBJECT: u8 = 0x06;

/// ACE flag bit marking an entry inherited from a parent container.
pub const ACE_FLAG_INHERITED: u8 = 0x10;

/// Object-ace flag: the object-type GUID field is present.
const OBJECT_TYPE_PRESENT: u32 = 0x1;
/// Object-ace flag: the inherited-object-type GUID field is present.
const INHERITED_OBJECT_TYPE_PRESENT: u32 = 0x2;

/// Fixed prefix of every ACE record: type, flags, and size.
pub(crate) const ACE_HEADER_LEN: usize = 4;

/// Grant or deny, the only two entry types the ACL engine manipulates.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryType {
    /// The entry grants its access mask.
    Allow,
    /// The entry denies its access mask.
    Deny,
}

/// Extra payload carried by object ACEs (types 0x05/0x06).
///
/// DCOM descriptors never contain these, but blobs written by other tools
/// may; the payload is preserved byte-for-byte so round trips are loss-free.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ObjectAceData {
    /// Raw object-ace flags word.
    pub object_flags: u32,
    /// Object-type GUID, present when bit 0x1 of `object_flags` is set.
    pub object_type: Option<[u8; 16]>,
    /// Inherited-object-type GUID, present when bit 0x2 is set.
    pub inherited_object_type: Option<[u8; 16]>,
}

/// The kind of an ACE record, mirroring its wire type byte.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum AceKind {
    /// Access allowed on the object.
    Allow,
    /// Access denied on the object.
    Deny,
    /// Access allowed on a child or property.
    AllowObject(ObjectAceData),
    /// Access denied on a child or property.
    DenyObject(ObjectAceData),
    /// Any other ACE type with a common-shaped body (for example the audit
    /// types). Preserved verbatim; rejected by canonicalization because it
    /// fits none of the canonical buckets.
    Unknown(u8),
}

/// One raw (principal, type, mask) entry of a discretionary ACL.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RawAce {
    /// Entry kind, mirroring the wire type byte.
    pub kind: AceKind,
    /// Raw ACE flags byte; bit 0x10 marks an inherited entry.
    pub flags: u8,
    /// The 32-bit access mask.
    pub mask: AccessMask,
    /// The trustee this entry applies to.
    pub sid: Sid,
}

impl RawAce {
    /// A non-inherited allow entry.
    pub fn allow(sid: Sid, mask: AccessMask) -> Self {
        Self {
            kind: AceKind::Allow,
            flags: 0,
            mask,
            sid,
        }
    }

    /// A non-inherited deny entry.
    pub fn deny(sid: Sid, mask: AccessMask) -> Self {
        Self {
            kind: AceKind::Deny,
            flags: 0,
            mask,
            sid,
        }
    }

    /// A non-inherited entry of the given type.
    pub fn new(entry_type: EntryType, sid: Sid, mask: AccessMask) -> Self {
        match entry_type {
            EntryType::Allow => Self::allow(sid, mask),
            EntryType::Deny => Self::deny(sid, mask),
        }
    }

    /// Projects the allow/deny polarity of this entry.
    ///
    /// Returns `None` for [`AceKind::Unknown`], which has neither polarity.
    pub fn entry_type(&self) -> Option<EntryType> {
        match self.kind {
            AceKind::Allow | AceKind::AllowObject(_) => Some(EntryType::Allow),
            AceKind::Deny | AceKind::DenyObject(_) => Some(EntryType::Deny),
            AceKind::Unknown(_) => None,
        }
    }

    /// Whether the entry was inherited from a parent container.
    pub const fn is_inherited(&self) -> bool {
        self.flags & ACE_FLAG_INHERITED != 0
    }

    /// The wire type byte for this entry.
    pub fn type_code(&self) -> u8 {
        match &self.kind {
            AceKind::Allow => ACE_TYPE_ACCESS_ALLOWED,
            AceKind::Deny => ACE_TYPE_ACCESS_DENIED,
            AceKind::AllowObject(_) => ACE_TYPE_ACCESS_ALLOWED_OBJECT,
            AceKind::DenyObject(_) => ACE_TYPE_ACCESS_DENIED_OBJECT,
            AceKind::Unknown(code) => *code,
        }
    }

    /// Decodes one ACE record starting at the beginning of `bytes`.
    ///
    /// Returns the entry and the number of bytes consumed, which always
    /// equals the record's declared size.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), DescriptorError> {
        if bytes.len() < ACE_HEADER_LEN + 4 {
            return Err(DescriptorError::malformed(
                "ACE record truncated before header and access mask",
            ));
        }
        let type_code = bytes[0];
        let flags = bytes[1];
        let declared = usize::from(u16::from_le_bytes([bytes[2], bytes[3]]));
        if declared < ACE_HEADER_LEN + 4 || declared > bytes.len() {
            return Err(DescriptorError::malformed(format!(
                "ACE declares {declared} bytes, {} available",
                bytes.len()
            )));
        }
        let body = &bytes[..declared];
        let mask = AccessMask::from_bits(u32::from_le_bytes([body[4], body[5], body[6], body[7]]));
        let mut at = ACE_HEADER_LEN + 4;

        let kind = match type_code {
            ACE_TYPE_ACCESS_ALLOWED => AceKind::Allow,
            ACE_TYPE_ACCESS_DENIED => AceKind::Deny,
            ACE_TYPE_ACCESS_ALLOWED_OBJECT | ACE_TYPE_ACCESS_DENIED_OBJECT => {
                let (data, consumed) = decode_object_data(&body[at..])?;
                at += consumed;
                if type_code == ACE_TYPE_ACCESS_ALLOWED_OBJECT {
                    AceKind::AllowObject(data)
                } else {
                    AceKind::DenyObject(data)
                }
            }
            other => AceKind::Unknown(other),
        };

        let (sid, sid_len) = Sid::decode(&body[at..])?;
        at += sid_len;
        if at != declared {
            return Err(DescriptorError::malformed(format!(
                "ACE declares {declared} bytes but its fields occupy {at}"
            )));
        }

        Ok((
            Self {
                kind,
                flags,
                mask,
                sid,
            },
            declared,
        ))
    }

    /// Appends the wire form of this entry to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.push(self.type_code());
        out.push(self.flags);
        out.extend_from_slice(&[0, 0]); // size backfilled below
        out.extend_from_slice(&self.mask.bits().to_le_bytes());
        match &self.kind {
            AceKind::AllowObject(data) | AceKind::DenyObject(data) => {
                out.extend_from_slice(&data.object_flags.to_le_bytes());
                if let Some(guid) = &data.object_type {
                    out.extend_from_slice(guid);
                }
                if let Some(guid) = &data.inherited_object_type {
                    out.extend_from_slice(guid);
                }
            }
            AceKind::Allow | AceKind::Deny | AceKind::Unknown(_) => {}
        }
        self.sid.encode_into(out);
        let size = (out.len() - start) as u16;
        out[start + 2..start + 4].copy_from_slice(&size.to_le_bytes());
    }
}

fn decode_object_data(bytes: &[u8]) -> Result<(ObjectAceData, usize), DescriptorError> {
    if bytes.len() < 4 {
        return Err(DescriptorError::malformed(
            "object ACE truncated before its flags word",
        ));
    }
    let object_flags = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let mut at = 4;
    let mut read_guid = |present: bool| -> Result<Option<[u8; 16]>, DescriptorError> {
        if !present {
            return Ok(None);
        }
        let end = at + 16;
        if bytes.len() < end {
            return Err(DescriptorError::malformed(
                "object ACE truncated inside a GUID field",
            ));
        }
        let mut guid = [0u8; 16];
        guid.copy_from_slice(&bytes[at..end]);
        at = end;
        Ok(Some(guid))
    };
    let object_type = read_guid(object_flags & OBJECT_TYPE_PRESENT != 0)?;
    let inherited_object_type = read_guid(object_flags & INHERITED_OBJECT_TYPE_PRESENT != 0)?;
    Ok((
        ObjectAceData {
            object_flags,
            object_type,
            inherited_object_type,
        },
        at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rights::AccessRight;

    #[test]
    fn common_ace_roundtrip() {
        let ace = RawAce::allow(
            Sid::local_system(),
            AccessMask::from_rights(&[AccessRight::Execute, AccessRight::ExecuteLocal]),
        );
        let mut bytes = Vec::new();
        ace.encode_into(&mut bytes);

        let (decoded, consumed) = RawAce::decode(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, ace);
        assert_eq!(decoded.entry_type(), Some(EntryType::Allow));
        assert!(!decoded.is_inherited());
    }

    #[test]
    fn object_ace_preserves_guids() {
        let ace = RawAce {
            kind: AceKind::DenyObject(ObjectAceData {
                object_flags: 0x3,
                object_type: Some([0xAB; 16]),
                inherited_object_type: Some([0xCD; 16]),
            }),
            flags: 0,
            mask: AccessMask::from_bits(7),
            sid: Sid::builtin_administrators(),
        };
        let mut bytes = Vec::new();
        ace.encode_into(&mut bytes);

        let (decoded, _) = RawAce::decode(&bytes).unwrap();
        assert_eq!(decoded, ace);
        assert_eq!(decoded.entry_type(), Some(EntryType::Deny));
    }

    #[test]
    fn audit_type_decodes_as_unknown() {
        let mut ace = RawAce::allow(Sid::well_known_self(), AccessMask::from_bits(1));
        ace.kind = AceKind::Unknown(0x02);
        let mut bytes = Vec::new();
        ace.encode_into(&mut bytes);

        let (decoded, _) = RawAce::decode(&bytes).unwrap();
        assert_eq!(decoded.kind, AceKind::Unknown(0x02));
        assert_eq!(decoded.entry_type(), None);
    }

    #[test]
    fn rejects_undersized_declaration() {
        let ace = RawAce::allow(Sid::local_system(), AccessMask::from_bits(1));
        let mut bytes = Vec::new();
        ace.encode_into(&mut bytes);
        bytes[2] = 6; // declared size smaller than header + mask
        bytes[3] = 0;
        assert!(matches!(
            RawAce::decode(&bytes),
            Err(DescriptorError::Malformed(_))
        ));
    }
}
