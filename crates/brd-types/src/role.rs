//! Caller roles and collaborator kinds

use crate::ids::Identity;
use crate::ParseLabelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role carried by an authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Creator role: authors the document
    #[serde(rename = "ROLE_BA")]
    BusinessAnalyst,
    /// Collaborator kind A: document reviewer
    #[serde(rename = "ROLE_REVIEWER")]
    Reviewer,
    /// Collaborator kind B: billing-side reviewer
    #[serde(rename = "ROLE_PM")]
    ProjectManager,
    /// Oversight: read-only
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    /// Every role
    pub const ALL: [Role; 4] = [
        Role::BusinessAnalyst,
        Role::Reviewer,
        Role::ProjectManager,
        Role::Admin,
    ];

    /// Canonical label
    #[inline]
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Role::BusinessAnalyst => "ROLE_BA",
            Role::Reviewer => "ROLE_REVIEWER",
            Role::ProjectManager => "ROLE_PM",
            Role::Admin => "ROLE_ADMIN",
        }
    }

    /// Collaborator kind this role is assigned as, if any
    #[inline]
    #[must_use]
    pub fn collaborator_kind(self) -> Option<CollaboratorKind> {
        match self {
            Role::Reviewer => Some(CollaboratorKind::Reviewer),
            Role::ProjectManager => Some(CollaboratorKind::ProjectManager),
            Role::BusinessAnalyst | Role::Admin => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.label() == s)
            .ok_or_else(|| ParseLabelError::new("role", s))
    }
}

/// Kind of externally-assigned collaborator
///
/// At most one identity is actively assigned per (document, kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CollaboratorKind {
    /// Kind A, active during internal review
    Reviewer,
    /// Kind B, active while in progress and at sign-off
    ProjectManager,
}

impl CollaboratorKind {
    /// Both kinds
    pub const ALL: [CollaboratorKind; 2] =
        [CollaboratorKind::Reviewer, CollaboratorKind::ProjectManager];

    /// Role an identity must hold to be assigned as this kind
    #[inline]
    #[must_use]
    pub fn role(self) -> Role {
        match self {
            CollaboratorKind::Reviewer => Role::Reviewer,
            CollaboratorKind::ProjectManager => Role::ProjectManager,
        }
    }

    /// Short name used in messages ("reviewer", "PM")
    #[inline]
    #[must_use]
    pub fn short_name(self) -> &'static str {
        match self {
            CollaboratorKind::Reviewer => "reviewer",
            CollaboratorKind::ProjectManager => "PM",
        }
    }
}

impl fmt::Display for CollaboratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Quota category for comments, derived from the author's role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UserType {
    /// Creator-side comments
    #[serde(rename = "BA")]
    Ba,
    /// Document-reviewer comments
    #[serde(rename = "REVIEWER")]
    Reviewer,
    /// Billing-side comments
    #[serde(rename = "PM")]
    Pm,
}

impl UserType {
    /// Quota category for a role; oversight never comments
    #[inline]
    #[must_use]
    pub fn for_role(role: Role) -> Option<Self> {
        match role {
            Role::BusinessAnalyst => Some(UserType::Ba),
            Role::Reviewer => Some(UserType::Reviewer),
            Role::ProjectManager => Some(UserType::Pm),
            Role::Admin => None,
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UserType::Ba => "BA",
            UserType::Reviewer => "REVIEWER",
            UserType::Pm => "PM",
        })
    }
}

/// Explicit caller context threaded through every operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    /// Who is calling
    pub identity: Identity,
    /// Under which role
    pub role: Role,
}

impl Caller {
    /// Create caller context
    #[inline]
    #[must_use]
    pub fn new(identity: impl Into<Identity>, role: Role) -> Self {
        Self {
            identity: identity.into(),
            role,
        }
    }

    /// Build a caller from raw transport labels
    ///
    /// # Errors
    /// Returns [`ParseLabelError`] when the role label is not canonical.
    pub fn from_labels(identity: &str, role: &str) -> Result<Self, ParseLabelError> {
        Ok(Self::new(identity, role.parse()?))
    }

    /// Quota category of this caller's comments
    #[inline]
    #[must_use]
    pub fn user_type(&self) -> Option<UserType> {
        UserType::for_role(self.role)
    }
}
