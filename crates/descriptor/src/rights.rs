//! Elementary DCOM access rights and the 32-bit mask that carries them.
//!
//! The bit values are fixed by the authorization subsystem and must never
//! change: Execute=1, ExecuteLocal=2, ExecuteRemote=4, ActivateLocal=8,
//! ActivateRemote=16.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// One elementary right in a DCOM access mask.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum AccessRight {
    /// General execute permission; always present in a composed mask.
    Execute = 1,
    /// Execute from the local machine.
    ExecuteLocal = 2,
    /// Execute from a remote machine.
    ExecuteRemote = 4,
    /// Activate (instantiate) from the local machine.
    ActivateLocal = 8,
    /// Activate (instantiate) from a remote machine.
    ActivateRemote = 16,
}

impl AccessRight {
    /// All five elementary rights, in ascending bit order.
    pub const ALL: [Self; 5] = [
        Self::Execute,
        Self::ExecuteLocal,
        Self::ExecuteRemote,
        Self::ActivateLocal,
        Self::ActivateRemote,
    ];

    /// The wire bit for this right.
    pub const fn bit(self) -> u32 {
        self as u32
    }

    /// Stable display name, matching the subsystem's own vocabulary.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Execute => "Execute",
            Self::ExecuteLocal => "ExecuteLocal",
            Self::ExecuteRemote => "ExecuteRemote",
            Self::ActivateLocal => "ActivateLocal",
            Self::ActivateRemote => "ActivateRemote",
        }
    }
}

impl fmt::Display for AccessRight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 32-bit access mask combining [`AccessRight`] bits.
///
/// The mask is deliberately not restricted to the five known bits: blobs
/// written by other tools may carry extra bits and those must survive a
/// decode/encode round trip untouched.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AccessMask(u32);

impl AccessMask {
    /// The empty mask.
    pub const EMPTY: Self = Self(0);

    /// Wraps a raw 32-bit mask.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Builds a mask from a list of rights.
    pub fn from_rights(rights: &[AccessRight]) -> Self {
        let mut mask = Self::EMPTY;
        for right in rights {
            mask |= *right;
        }
        mask
    }

    /// The raw 32-bit value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether `right` is set.
    pub const fn contains(self, right: AccessRight) -> bool {
        self.0 & right.bit() != 0
    }

    /// Whether any bit of `other` is set in this mask.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether no bits are set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The known elementary rights present in this mask, in bit order.
    pub fn rights(self) -> Vec<AccessRight> {
        AccessRight::ALL
            .into_iter()
            .filter(|right| self.contains(*right))
            .collect()
    }
}

impl BitOr for AccessMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AccessMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitOr<AccessRight> for AccessMask {
    type Output = Self;

    fn bitor(self, rhs: AccessRight) -> Self {
        Self(self.0 | rhs.bit())
    }
}

impl BitOrAssign<AccessRight> for AccessMask {
    fn bitor_assign(&mut self, rhs: AccessRight) {
        self.0 |= rhs.bit();
    }
}

impl From<AccessRight> for AccessMask {
    fn from(right: AccessRight) -> Self {
        Self(right.bit())
    }
}

impl fmt::Display for AccessMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }
        let mut first = true;
        for right in AccessRight::ALL {
            if self.contains(right) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(right.name())?;
                first = false;
            }
        }
        let unknown = self.0 & !AccessMask::from_rights(&AccessRight::ALL).bits();
        if unknown != 0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{unknown:#x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for AccessMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessMask({self})")
    }
}
