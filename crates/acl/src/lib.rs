#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! Typed access-control-entry model for the DCOM permission categories.
//!
//! The [`descriptor`] crate deals in raw (principal, type, mask) tuples;
//! this crate translates those into the six human-meaningful capability
//! flags an operator actually reasons about (local/remote access for the
//! call-class category, local/remote launch and activation for the
//! activation-class category) and back again.
//!
//! Translation is directional and deliberately asymmetric:
//!
//! - [`decompose`] expands raw masks into [`AccessControlEntry`] values,
//!   resolving each principal to a display name through a best-effort
//!   [`PrincipalResolver`]; resolution failures fall back to the canonical
//!   SID string and never fail the decomposition.
//! - [`compose`] folds a rights list back into a wire mask, always seeding
//!   the Execute bit the authorization subsystem requires.

mod category;
mod derive;
mod entry;
mod error;
mod resolve;

pub use category::{PermissionCategory, PermissionScope};
pub use derive::{compose, decompose};
pub use entry::AccessControlEntry;
pub use error::AclError;
pub use resolve::{NullResolver, PrincipalResolver};
