//! Lifecycle transition policy

use crate::reason::DenyReason;
use brd_types::{CollaboratorKind, LifecycleState, Role};

/// States in which a collaborator kind holds the document
#[must_use]
pub fn review_window(kind: CollaboratorKind) -> &'static [LifecycleState] {
    use LifecycleState::*;
    match kind {
        CollaboratorKind::Reviewer => &[InternalReview],
        CollaboratorKind::ProjectManager => &[InProgress, ReadyForSignOff],
    }
}

/// Pure transition decision table
///
/// The guard is on the *current* state only; the requested target does not
/// change the outcome. Collaborator assignment is checked by the caller of
/// this policy through [`crate::AccessGate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusPolicy;

impl StatusPolicy {
    /// Create policy
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Decide whether `role` may move a document out of `current` towards `target`
    ///
    /// # Errors
    /// Returns the role-specific [`DenyReason`] when the guard fails.
    pub fn check_transition(
        &self,
        role: Role,
        current: LifecycleState,
        _target: LifecycleState,
    ) -> Result<(), DenyReason> {
        if role == Role::Admin {
            return Err(DenyReason::OversightReadOnly);
        }
        if current.is_terminal() {
            return Err(DenyReason::AlreadySubmitted);
        }
        match role.collaborator_kind() {
            Some(kind) => {
                if review_window(kind).contains(&current) {
                    Ok(())
                } else {
                    Err(DenyReason::OutsideReviewWindow { role, state: current })
                }
            }
            None => {
                if Self::creator_window_closed(current) {
                    Err(DenyReason::CreatorWindowClosed { state: current })
                } else {
                    Ok(())
                }
            }
        }
    }

    /// States from which `role` may transition
    #[must_use]
    pub fn allowed_states(&self, role: Role) -> Vec<LifecycleState> {
        LifecycleState::ALL
            .into_iter()
            .filter(|&state| self.check_transition(role, state, state).is_ok())
            .collect()
    }

    /// While a collaborator holds the document the creator waits
    fn creator_window_closed(state: LifecycleState) -> bool {
        CollaboratorKind::ALL
            .into_iter()
            .any(|kind| review_window(kind).contains(&state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn allowed_pairs() -> Vec<(Role, LifecycleState)> {
        vec![
            (Role::BusinessAnalyst, LifecycleState::Draft),
            (Role::Reviewer, LifecycleState::InternalReview),
            (Role::ProjectManager, LifecycleState::InProgress),
            (Role::ProjectManager, LifecycleState::ReadyForSignOff),
        ]
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop_oneof![
            Just(Role::BusinessAnalyst),
            Just(Role::Reviewer),
            Just(Role::ProjectManager),
            Just(Role::Admin),
        ]
    }

    fn any_state() -> impl Strategy<Value = LifecycleState> {
        prop_oneof![
            Just(LifecycleState::Draft),
            Just(LifecycleState::InProgress),
            Just(LifecycleState::InternalReview),
            Just(LifecycleState::ReadyForSignOff),
            Just(LifecycleState::Submitted),
        ]
    }

    #[test]
    fn creator_denied_in_collaborator_windows() {
        let policy = StatusPolicy::new();
        for state in [
            LifecycleState::InProgress,
            LifecycleState::InternalReview,
            LifecycleState::ReadyForSignOff,
        ] {
            assert_eq!(
                policy.check_transition(Role::BusinessAnalyst, state, LifecycleState::Submitted),
                Err(DenyReason::CreatorWindowClosed { state })
            );
        }
    }

    #[test]
    fn submitted_denies_with_distinct_reason() {
        let policy = StatusPolicy::new();
        for target in LifecycleState::ALL {
            assert_eq!(
                policy.check_transition(Role::BusinessAnalyst, LifecycleState::Submitted, target),
                Err(DenyReason::AlreadySubmitted)
            );
        }
    }

    #[test]
    fn oversight_never_transitions() {
        let policy = StatusPolicy::new();
        assert!(policy.allowed_states(Role::Admin).is_empty());
    }

    #[test]
    fn collaborator_windows() {
        let policy = StatusPolicy::new();
        assert_eq!(
            policy.allowed_states(Role::Reviewer),
            vec![LifecycleState::InternalReview]
        );
        assert_eq!(
            policy.allowed_states(Role::ProjectManager),
            vec![LifecycleState::InProgress, LifecycleState::ReadyForSignOff]
        );
        assert_eq!(
            policy.allowed_states(Role::BusinessAnalyst),
            vec![LifecycleState::Draft]
        );
    }

    proptest! {
        #[test]
        fn prop_only_table_pairs_allowed(
            role in any_role(),
            current in any_state(),
            target in any_state(),
        ) {
            let allowed = allowed_pairs().contains(&(role, current));
            let result = StatusPolicy::new().check_transition(role, current, target);
            prop_assert_eq!(result.is_ok(), allowed);
        }

        #[test]
        fn prop_target_does_not_matter(
            role in any_role(),
            current in any_state(),
            a in any_state(),
            b in any_state(),
        ) {
            let policy = StatusPolicy::new();
            prop_assert_eq!(
                policy.check_transition(role, current, a),
                policy.check_transition(role, current, b)
            );
        }
    }
}
