//! Denial reasons

use brd_types::{CollaboratorKind, LifecycleState, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a decision denied
///
/// The variant is the observable category; the `Display` text is for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum DenyReason {
    /// The document is submitted; nothing moves any more
    AlreadySubmitted,
    /// The creator may not act while collaborators hold the document
    CreatorWindowClosed {
        /// State the document is in
        state: LifecycleState,
    },
    /// Caller is not the document's creator
    NotDocumentCreator,
    /// Caller is not the active collaborator of this kind
    NotAssigned {
        /// Kind the caller's role maps to
        kind: CollaboratorKind,
    },
    /// The collaborator's review window does not include this state
    OutsideReviewWindow {
        /// Caller role
        role: Role,
        /// State the document is in
        state: LifecycleState,
    },
    /// Oversight cannot change lifecycle state
    OversightReadOnly,
    /// Oversight does not take part in field discussion
    OversightExcludedFromComments,
    /// Only the creator role may promote staged values
    CreatorOnly,
    /// The role label did not parse
    UnrecognizedRole,
}

impl DenyReason {
    /// Stable category code
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            DenyReason::AlreadySubmitted => "already_submitted",
            DenyReason::CreatorWindowClosed { .. } => "creator_window_closed",
            DenyReason::NotDocumentCreator => "not_document_creator",
            DenyReason::NotAssigned { .. } => "not_assigned",
            DenyReason::OutsideReviewWindow { .. } => "outside_review_window",
            DenyReason::OversightReadOnly => "oversight_read_only",
            DenyReason::OversightExcludedFromComments => "oversight_excluded_from_comments",
            DenyReason::CreatorOnly => "creator_only",
            DenyReason::UnrecognizedRole => "unrecognized_role",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::AlreadySubmitted => f.write_str("document already submitted"),
            DenyReason::CreatorWindowClosed { state } => write!(
                f,
                "document is in {state}; only the assigned collaborator may act"
            ),
            DenyReason::NotDocumentCreator => f.write_str("caller did not create this document"),
            DenyReason::NotAssigned { kind } => {
                write!(f, "caller is not the assigned {kind} for this document")
            }
            DenyReason::OutsideReviewWindow { role, state } => {
                write!(f, "{role} may not act while the document is in {state}")
            }
            DenyReason::OversightReadOnly => f.write_str("oversight role is read-only"),
            DenyReason::OversightExcludedFromComments => {
                f.write_str("oversight role cannot take part in field comments")
            }
            DenyReason::CreatorOnly => f.write_str("only the document creator may do this"),
            DenyReason::UnrecognizedRole => f.write_str("unrecognized role"),
        }
    }
}
