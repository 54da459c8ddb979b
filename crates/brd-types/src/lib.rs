//! BRD Types
//!
//! Closed vocabulary shared by every layer of the review engine:
//! - [`Role`], [`CollaboratorKind`] and [`UserType`] for callers
//! - [`LifecycleState`] for documents
//! - [`CommentGroupKey`], [`CommentGroup`] and [`CommentEntry`] for field discussion
//! - [`ShadowValue`] and [`FieldType`] for staged edits
//!
//! Role and state labels are parsed exactly once at the boundary. Everything
//! past that point matches on enums, so an unknown label can never fall
//! through to a silent denial.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod comment;
mod document;
mod ids;
mod lifecycle;
mod role;

pub use comment::{
    CommentEntry, CommentGroup, CommentGroupKey, EntityKind, FieldTarget, FieldType,
    GroupStatus, KeyError, ShadowValue,
};
pub use document::{Assignment, Document};
pub use ids::{DocumentId, EntryId, Identity, SubEntityId};
pub use lifecycle::LifecycleState;
pub use role::{Caller, CollaboratorKind, Role, UserType};

/// Failure to parse a canonical label into one of the closed enums
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind} label: {label:?}")]
pub struct ParseLabelError {
    /// Which vocabulary was being parsed ("role", "lifecycle state", ...)
    pub kind: &'static str,
    /// The offending label, verbatim
    pub label: String,
}

impl ParseLabelError {
    pub(crate) fn new(kind: &'static str, label: &str) -> Self {
        Self {
            kind,
            label: label.to_string(),
        }
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
