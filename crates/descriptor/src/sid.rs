//! Binary security-identifier (SID) records.
//!
//! A SID is stored as: revision (1 byte), sub-authority count (1 byte), a
//! 48-bit identifier authority in big-endian order (6 bytes), then up to 15
//! little-endian `u32` sub-authorities. Identity is exact binary equality;
//! the canonical `S-1-…` string form exists only for presentation and
//! parsing, never for comparison.

use std::fmt;
use std::str::FromStr;

use crate::error::DescriptorError;

/// The only SID revision the wire format defines.
pub const SID_REVISION: u8 = 1;

/// Upper bound on sub-authorities in one SID record.
const MAX_SUB_AUTHORITIES: usize = 15;

/// Fixed prefix of every SID record: revision, count, and authority bytes.
const SID_HEADER_LEN: usize = 8;

/// A binary security identifier.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Sid {
    authority: u64,
    sub_authorities: Vec<u32>,
}

impl Sid {
    /// Builds a SID from an identifier authority and sub-authority list.
    ///
    /// Fails when the sub-authority list exceeds the 15-entry wire limit or
    /// the authority does not fit in 48 bits.
    pub fn new(authority: u64, sub_authorities: Vec<u32>) -> Result<Self, DescriptorError> {
        if sub_authorities.len() > MAX_SUB_AUTHORITIES {
            return Err(DescriptorError::malformed(format!(
                "SID has {} sub-authorities, maximum is {MAX_SUB_AUTHORITIES}",
                sub_authorities.len()
            )));
        }
        if authority >= 1 << 48 {
            return Err(DescriptorError::malformed(format!(
                "SID identifier authority {authority:#x} exceeds 48 bits"
            )));
        }
        Ok(Self {
            authority,
            sub_authorities,
        })
    }

    /// `NT AUTHORITY\SELF` (S-1-5-10).
    pub fn well_known_self() -> Self {
        Self {
            authority: 5,
            sub_authorities: vec![10],
        }
    }

    /// `NT AUTHORITY\SYSTEM` (S-1-5-18).
    pub fn local_system() -> Self {
        Self {
            authority: 5,
            sub_authorities: vec![18],
        }
    }

    /// `BUILTIN\Administrators` (S-1-5-32-544).
    pub fn builtin_administrators() -> Self {
        Self {
            authority: 5,
            sub_authorities: vec![32, 544],
        }
    }

    /// The 48-bit identifier authority.
    pub fn authority(&self) -> u64 {
        self.authority
    }

    /// The sub-authority values, in wire order.
    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authorities
    }

    /// Number of bytes this SID occupies on the wire.
    pub fn binary_len(&self) -> usize {
        SID_HEADER_LEN + 4 * self.sub_authorities.len()
    }

    /// Decodes one SID record starting at the beginning of `bytes`.
    ///
    /// Returns the SID and the number of bytes consumed.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), DescriptorError> {
        if bytes.len() < SID_HEADER_LEN {
            return Err(DescriptorError::malformed(
                "SID record truncated before the 8-byte header",
            ));
        }
        let revision = bytes[0];
        if revision != SID_REVISION {
            return Err(DescriptorError::malformed(format!(
                "unsupported SID revision {revision}"
            )));
        }
        let count = bytes[1] as usize;
        if count > MAX_SUB_AUTHORITIES {
            return Err(DescriptorError::malformed(format!(
                "SID declares {count} sub-authorities, maximum is {MAX_SUB_AUTHORITIES}"
            )));
        }
        let len = SID_HEADER_LEN + 4 * count;
        if bytes.len() < len {
            return Err(DescriptorError::malformed(format!(
                "SID record truncated: {len} bytes declared, {} available",
                bytes.len()
            )));
        }

        // Identifier authority is the one big-endian field in the layout.
        let mut authority = 0u64;
        for &b in &bytes[2..8] {
            authority = (authority << 8) | u64::from(b);
        }

        let mut sub_authorities = Vec::with_capacity(count);
        for i in 0..count {
            let at = SID_HEADER_LEN + 4 * i;
            sub_authorities.push(u32::from_le_bytes([
                bytes[at],
                bytes[at + 1],
                bytes[at + 2],
                bytes[at + 3],
            ]));
        }

        Ok((
            Self {
                authority,
                sub_authorities,
            },
            len,
        ))
    }

    /// Appends the wire form of this SID to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(SID_REVISION);
        out.push(self.sub_authorities.len() as u8);
        for shift in (0..6).rev() {
            out.push(((self.authority >> (shift * 8)) & 0xFF) as u8);
        }
        for sub in &self.sub_authorities {
            out.extend_from_slice(&sub.to_le_bytes());
        }
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-1-{}", self.authority)?;
        for sub in &self.sub_authorities {
            write!(f, "-{sub}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sid({self})")
    }
}

impl FromStr for Sid {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("S-1-")
            .or_else(|| s.strip_prefix("s-1-"))
            .ok_or_else(|| {
                DescriptorError::malformed(format!("SID string {s:?} lacks the S-1- prefix"))
            })?;
        let mut parts = rest.split('-');
        let authority = parts
            .next()
            .filter(|p| !p.is_empty())
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(|| {
                DescriptorError::malformed(format!(
                    "SID string {s:?} has no parsable identifier authority"
                ))
            })?;
        let mut sub_authorities = Vec::new();
        for part in parts {
            let sub = part.parse::<u32>().map_err(|_| {
                DescriptorError::malformed(format!(
                    "SID string {s:?} has a non-numeric sub-authority {part:?}"
                ))
            })?;
            sub_authorities.push(sub);
        }
        Self::new(authority, sub_authorities)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Sid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Sid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
