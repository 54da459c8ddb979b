//! Role × state decision matrix

use crate::comment_rule::CommentRule;
use crate::gate::{AccessFacts, AccessGate};
use crate::reason::DenyReason;
use crate::status::StatusPolicy;
use brd_types::{Identity, LifecycleState, Role};
use serde::Serialize;
use std::fmt;

/// Outcome of one rule for one (role, state) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "reason", rename_all = "lowercase")]
pub enum Decision {
    /// Permitted
    Allow,
    /// Refused, with the category
    Deny(DenyReason),
}

impl From<Result<(), DenyReason>> for Decision {
    fn from(result: Result<(), DenyReason>) -> Self {
        match result {
            Ok(()) => Decision::Allow,
            Err(reason) => Decision::Deny(reason),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => f.write_str("allow"),
            Decision::Deny(reason) => f.write_str(reason.code()),
        }
    }
}

/// One row of the matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRow {
    /// Caller role
    pub role: Role,
    /// Current document state
    pub state: LifecycleState,
    /// May the role move the document out of this state
    pub transition: Decision,
    /// May the role read the document
    pub access: Decision,
    /// May the role take part in field discussion
    pub comment: Decision,
}

/// Every (role, state) pair, assuming the caller is the creator (for the
/// creator role) or the active collaborator (for collaborator roles)
#[must_use]
pub fn policy_table() -> Vec<PolicyRow> {
    let policy = StatusPolicy::new();
    let rule = CommentRule::new();
    let identity = Identity::new("caller");
    let facts = AccessFacts {
        creator: identity.clone(),
        assigned: true,
    };

    Role::ALL
        .into_iter()
        .flat_map(|role| LifecycleState::ALL.into_iter().map(move |state| (role, state)))
        .map(|(role, state)| PolicyRow {
            role,
            state,
            transition: policy.check_transition(role, state, state).into(),
            access: AccessGate::evaluate(role, &identity, state, &facts).into(),
            comment: rule.check(role, &identity, state, &facts).into(),
        })
        .collect()
}
