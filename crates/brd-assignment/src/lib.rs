//! BRD Assignment
//!
//! Tracks which identity currently holds each collaborator kind on a
//! document. Assignment is single-active per (document, kind): assigning a
//! different identity supersedes the previous record, which stays in the
//! history as inactive.
//!
//! [`AssignmentResolver::bulk_reassign`] applies many reassignments at once.
//! Items are independent, run concurrently, and fail individually.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod bulk;
mod resolver;

pub use bulk::{BulkReassignResponse, ItemFailure, ItemOutcome, ItemResult, ReassignItem, ReassignStatus};
pub use resolver::AssignmentResolver;

use brd_store::StoreError;
use brd_types::{CollaboratorKind, DocumentId, Identity};

/// Assignment errors
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    /// Document does not exist
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// Identity lacks the role the collaborator kind requires
    #[error("{identity} is not a {}", kind.short_name())]
    RoleNotHeld {
        /// Identity being assigned
        identity: Identity,
        /// Kind being assigned
        kind: CollaboratorKind,
    },

    /// Backing store failed
    #[error("assignment store error: {0}")]
    Store(#[from] StoreError),
}

impl From<AssignmentError> for ItemFailure {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::DocumentNotFound(_) => ItemFailure::DocumentNotFound,
            AssignmentError::RoleNotHeld { kind, .. } => ItemFailure::RoleNotHeld { kind },
            AssignmentError::Store(e) => ItemFailure::Store {
                message: e.to_string(),
            },
        }
    }
}
