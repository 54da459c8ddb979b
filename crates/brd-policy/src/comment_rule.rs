//! Fine-grained rule for field discussion and shadow staging

use crate::gate::AccessFacts;
use crate::reason::DenyReason;
use crate::status::review_window;
use brd_types::{Identity, LifecycleState, Role};

/// Who may comment on, stage into, or read the discussion of a field
///
/// Runs after [`crate::AccessGate`]; differs from it in that oversight is
/// excluded and the creator has no state window.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentRule;

impl CommentRule {
    /// Create rule
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decide on pre-fetched facts
    ///
    /// # Errors
    /// Returns the [`DenyReason`] for the first check that fails.
    pub fn check(
        &self,
        role: Role,
        identity: &Identity,
        state: LifecycleState,
        facts: &AccessFacts,
    ) -> Result<(), DenyReason> {
        match (role, role.collaborator_kind()) {
            (Role::Admin, _) => Err(DenyReason::OversightExcludedFromComments),
            (Role::BusinessAnalyst, _) => {
                if *identity == facts.creator {
                    Ok(())
                } else {
                    Err(DenyReason::NotDocumentCreator)
                }
            }
            // kind A checks the window first, kind B the assignment first
            (Role::Reviewer, Some(kind)) => {
                if !review_window(kind).contains(&state) {
                    Err(DenyReason::OutsideReviewWindow { role, state })
                } else if !facts.assigned {
                    Err(DenyReason::NotAssigned { kind })
                } else {
                    Ok(())
                }
            }
            (_, Some(kind)) => {
                if !facts.assigned {
                    Err(DenyReason::NotAssigned { kind })
                } else if !review_window(kind).contains(&state) {
                    Err(DenyReason::OutsideReviewWindow { role, state })
                } else {
                    Ok(())
                }
            }
            (_, None) => Err(DenyReason::UnrecognizedRole),
        }
    }
}
