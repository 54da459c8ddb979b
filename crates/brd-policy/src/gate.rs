//! Document access gate

use crate::reason::DenyReason;
use crate::status::review_window;
use brd_assignment::{AssignmentError, AssignmentResolver};
use brd_types::{Caller, Document, Identity, LifecycleState, Role};

/// Facts about the document the gate decides on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessFacts {
    /// Creator of the document
    pub creator: Identity,
    /// Whether the caller is the active collaborator for their role's kind
    pub assigned: bool,
}

/// Access check failure
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// Decision was deny
    #[error("access denied: {0}")]
    Denied(DenyReason),

    /// Assignment lookup failed
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
}

/// Coarse read gate consulted before any document, field or comment access
#[derive(Debug, Clone)]
pub struct AccessGate {
    assignments: AssignmentResolver,
}

impl AccessGate {
    /// Create gate backed by an assignment resolver
    #[inline]
    #[must_use]
    pub fn new(assignments: AssignmentResolver) -> Self {
        Self { assignments }
    }

    /// Pure decision on pre-fetched facts
    ///
    /// # Errors
    /// Returns the [`DenyReason`] for the first rule that fails.
    pub fn evaluate(
        role: Role,
        identity: &Identity,
        state: LifecycleState,
        facts: &AccessFacts,
    ) -> Result<(), DenyReason> {
        match (role, role.collaborator_kind()) {
            (Role::Admin, _) => Ok(()),
            (Role::BusinessAnalyst, _) => {
                if *identity == facts.creator {
                    Ok(())
                } else {
                    Err(DenyReason::NotDocumentCreator)
                }
            }
            (_, Some(kind)) => {
                if !review_window(kind).contains(&state) {
                    return Err(DenyReason::OutsideReviewWindow { role, state });
                }
                if !facts.assigned {
                    return Err(DenyReason::NotAssigned { kind });
                }
                Ok(())
            }
            (_, None) => Err(DenyReason::UnrecognizedRole),
        }
    }

    /// Decide whether `caller` may access `document`
    ///
    /// Collaborator assignment is only looked up once the state window passes.
    ///
    /// # Errors
    /// [`AccessError::Denied`] on deny, [`AccessError::Assignment`] when the
    /// assignment lookup fails.
    pub async fn check_access(&self, caller: &Caller, document: &Document) -> Result<(), AccessError> {
        let assigned = match caller.role.collaborator_kind() {
            Some(kind) if review_window(kind).contains(&document.state) => {
                self.assignments
                    .is_assigned(&document.id, kind, &caller.identity)
                    .await?
            }
            _ => false,
        };
        let facts = AccessFacts {
            creator: document.creator.clone(),
            assigned,
        };
        Self::evaluate(caller.role, &caller.identity, document.state, &facts)
            .map_err(AccessError::Denied)
    }

    /// Whether `caller` is the active collaborator for their role's kind
    ///
    /// Always `false` for roles without a collaborator kind.
    ///
    /// # Errors
    /// Propagates assignment lookup failures.
    pub async fn is_assigned(&self, caller: &Caller, document: &Document) -> Result<bool, AssignmentError> {
        match caller.role.collaborator_kind() {
            Some(kind) => {
                self.assignments
                    .is_assigned(&document.id, kind, &caller.identity)
                    .await
            }
            None => Ok(false),
        }
    }
}
