//! Error type shared by the descriptor codec modules.

/// Errors produced while decoding, canonicalizing, or encoding a security
/// descriptor blob.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum DescriptorError {
    /// The byte sequence cannot be parsed as a self-relative security
    /// descriptor. The message names the first structural violation found.
    #[error("malformed security descriptor: {0}")]
    Malformed(String),

    /// Encoding produced a zero-length blob. Persisting an empty value would
    /// silently clear the stored ACL, so the write is rejected instead.
    #[error("encoded security descriptor is empty")]
    EmptyEncoding,

    /// The DACL cannot be partitioned into the canonical bucket order
    /// without dropping or duplicating an entry.
    #[error("DACL cannot be canonicalized without loss of information: {0}")]
    CanonicalizationDataLoss(String),
}

impl DescriptorError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed(detail.into())
    }
}
