//! Principal-name resolution seam.
//!
//! Translating a SID to `DOMAIN\account` form needs a directory or network
//! lookup that belongs to a collaborator, not this crate. The trait below is
//! that seam: implementations are best-effort and must not fail. A lookup
//! that cannot complete returns `None` and the caller falls back to the
//! SID's canonical string form.

use descriptor::Sid;

/// Resolves a binary principal identifier to a human-readable account name.
pub trait PrincipalResolver {
    /// Returns the display name for `sid`, looked up against `host` when
    /// one is given, or `None` when no name can be produced.
    fn resolve_name(&self, sid: &Sid, host: Option<&str>) -> Option<String>;
}

/// A resolver that never produces a name, forcing the SID-string fallback.
///
/// Useful for offline audits and tests, where directory lookups are either
/// unavailable or unwanted.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullResolver;

impl PrincipalResolver for NullResolver {
    fn resolve_name(&self, _sid: &Sid, _host: Option<&str>) -> Option<String> {
        None
    }
}

impl<F> PrincipalResolver for F
where
    F: Fn(&Sid, Option<&str>) -> Option<String>,
{
    fn resolve_name(&self, sid: &Sid, host: Option<&str>) -> Option<String> {
        self(sid, host)
    }
}
