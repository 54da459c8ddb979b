//! Error taxonomy surfaced to callers of the orchestrator

use crate::config::ConfigError;
use brd_assignment::AssignmentError;
use brd_comments::CommentError;
use brd_policy::{AccessError, DenyReason};
use brd_store::StoreError;
use brd_types::{
    CollaboratorKind, CommentGroupKey, DocumentId, EntryId, FieldType, Identity, KeyError,
    LifecycleState, ParseLabelError, UserType,
};
use serde::Serialize;
use std::fmt;
use ulid::Ulid;

/// What was missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NotFoundKind {
    /// Document
    Document(DocumentId),
    /// Comment group
    Group(CommentGroupKey),
    /// Comment entry
    Entry(EntryId),
    /// Parent entry of a reply
    ParentEntry(EntryId),
    /// Target field of a group
    Field(CommentGroupKey),
}

impl fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundKind::Document(id) => write!(f, "document {id}"),
            NotFoundKind::Group(key) => write!(f, "comment group {key}"),
            NotFoundKind::Entry(id) => write!(f, "comment entry {id}"),
            NotFoundKind::ParentEntry(id) => write!(f, "parent entry {id}"),
            NotFoundKind::Field(key) => write!(f, "field {key}"),
        }
    }
}

/// Why a request was rejected on its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationKind {
    /// The author's user type already holds `limit` entries in the group
    LimitExceeded {
        /// Author category
        user_type: UserType,
        /// Configured cap
        limit: usize,
    },
    /// Comment text is empty or too long
    InvalidText(String),
    /// Staged type tag differs from the field's declared type
    TypeMismatch {
        /// Declared type of the field
        expected: FieldType,
        /// Type tag of the staged value
        staged: FieldType,
    },
    /// Staged value is not an instance of its own type tag
    ValueTypeMismatch(FieldType),
    /// Nothing staged on the group
    NoShadowValue(CommentGroupKey),
    /// Group key failed validation
    MalformedKey(KeyError),
    /// Transition target is the state the document is already in
    SameState(LifecycleState),
    /// Assignee does not hold the role the kind requires
    RoleNotHeld {
        /// Identity being assigned
        identity: Identity,
        /// Kind being assigned
        kind: CollaboratorKind,
    },
    /// A non-role label did not parse
    UnknownLabel(ParseLabelError),
    /// Engine configuration has a zero limit
    ZeroLimit(&'static str),
    /// Engine configuration did not parse
    UnparsableConfig(String),
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationKind::LimitExceeded { user_type, limit } => {
                write!(f, "comment limit of {limit} reached for {user_type}")
            }
            ValidationKind::InvalidText(detail) => write!(f, "invalid comment text: {detail}"),
            ValidationKind::TypeMismatch { expected, staged } => {
                write!(f, "shadow value is {staged} but the field is {expected}")
            }
            ValidationKind::ValueTypeMismatch(tag) => write!(f, "value is not a valid {tag}"),
            ValidationKind::NoShadowValue(key) => write!(f, "no shadow value staged on {key}"),
            ValidationKind::MalformedKey(err) => write!(f, "malformed group key: {err}"),
            ValidationKind::SameState(state) => write!(f, "document is already {state}"),
            ValidationKind::RoleNotHeld { identity, kind } => {
                write!(f, "{identity} is not a {}", kind.short_name())
            }
            ValidationKind::UnknownLabel(err) => write!(f, "{err}"),
            ValidationKind::ZeroLimit(field) => write!(f, "{field} must be greater than zero"),
            ValidationKind::UnparsableConfig(detail) => write!(f, "invalid configuration: {detail}"),
        }
    }
}

/// Coarse category a transport maps to its own signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Role, assignment or state window mismatch
    AccessDenied,
    /// Document, group, entry or field missing
    NotFound,
    /// Request rejected on its content
    Validation,
    /// Lost a race against a concurrent change
    Conflict,
    /// Internal fault
    Unexpected,
}

impl ErrorCategory {
    /// Stable name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::AccessDenied => "access_denied",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::Unexpected => "unexpected",
        }
    }
}

/// Orchestrator error
#[derive(Debug, thiserror::Error)]
pub enum BrdError {
    /// Denied, with the reason category
    #[error("access denied: {0}")]
    AccessDenied(DenyReason),

    /// Something the request names does not exist
    #[error("not found: {0}")]
    NotFound(NotFoundKind),

    /// Request content rejected
    #[error("validation failed: {0}")]
    Validation(ValidationKind),

    /// Concurrent change won; safe to retry against fresh state
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal fault; detail is in the log under the incident ID
    #[error("unexpected internal error (incident {incident})")]
    Unexpected {
        /// Correlates the caller-facing error with the logged detail
        incident: Ulid,
    },
}

impl BrdError {
    /// Category of this error
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            BrdError::AccessDenied(_) => ErrorCategory::AccessDenied,
            BrdError::NotFound(_) => ErrorCategory::NotFound,
            BrdError::Validation(_) => ErrorCategory::Validation,
            BrdError::Conflict(_) => ErrorCategory::Conflict,
            BrdError::Unexpected { .. } => ErrorCategory::Unexpected,
        }
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Validation kind, when the request was rejected on its content
    #[inline]
    #[must_use]
    pub fn validation_kind(&self) -> Option<&ValidationKind> {
        match self {
            Self::Validation(kind) => Some(kind),
            _ => None,
        }
    }

    /// Deny reason, when access was denied
    #[inline]
    #[must_use]
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::AccessDenied(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Log `detail` and hide it behind a fresh incident ID
    pub fn unexpected(detail: impl fmt::Display) -> Self {
        let incident = Ulid::new();
        tracing::error!(%incident, detail = %detail, "unexpected fault");
        Self::Unexpected { incident }
    }
}

impl From<DenyReason> for BrdError {
    fn from(reason: DenyReason) -> Self {
        Self::AccessDenied(reason)
    }
}

impl From<StoreError> for BrdError {
    fn from(err: StoreError) -> Self {
        Self::unexpected(err)
    }
}

impl From<AssignmentError> for BrdError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::DocumentNotFound(id) => Self::NotFound(NotFoundKind::Document(id)),
            AssignmentError::RoleNotHeld { identity, kind } => {
                Self::Validation(ValidationKind::RoleNotHeld { identity, kind })
            }
            AssignmentError::Store(e) => Self::unexpected(e),
        }
    }
}

impl From<AccessError> for BrdError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Denied(reason) => Self::AccessDenied(reason),
            AccessError::Assignment(e) => e.into(),
        }
    }
}

impl From<CommentError> for BrdError {
    fn from(err: CommentError) -> Self {
        match err {
            CommentError::GroupNotFound(key) => Self::NotFound(NotFoundKind::Group(key)),
            CommentError::InvalidParent { parent } => {
                Self::NotFound(NotFoundKind::ParentEntry(parent))
            }
            CommentError::EntryNotFound(id) => Self::NotFound(NotFoundKind::Entry(id)),
            CommentError::FieldNotFound(key) => Self::NotFound(NotFoundKind::Field(key)),
            CommentError::Forbidden(_) => Self::AccessDenied(DenyReason::CreatorOnly),
            e @ CommentError::PromotionConflict(_) => Self::Conflict(e.to_string()),
            CommentError::Store(e) => Self::unexpected(e),
            CommentError::LimitExceeded { user_type, limit } => {
                Self::Validation(ValidationKind::LimitExceeded { user_type, limit })
            }
            CommentError::InvalidText(detail) => Self::Validation(ValidationKind::InvalidText(detail)),
            CommentError::TypeMismatch { expected, staged } => {
                Self::Validation(ValidationKind::TypeMismatch { expected, staged })
            }
            CommentError::ValueTypeMismatch(tag) => {
                Self::Validation(ValidationKind::ValueTypeMismatch(tag))
            }
            CommentError::NoShadowValue(key) => Self::Validation(ValidationKind::NoShadowValue(key)),
            CommentError::MalformedKey(err) => Self::Validation(ValidationKind::MalformedKey(err)),
        }
    }
}

impl From<ConfigError> for BrdError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Zero(field) => Self::Validation(ValidationKind::ZeroLimit(field)),
            ConfigError::Parse(e) => Self::Validation(ValidationKind::UnparsableConfig(e.to_string())),
        }
    }
}

impl From<ParseLabelError> for BrdError {
    fn from(err: ParseLabelError) -> Self {
        if err.kind == "role" {
            Self::AccessDenied(DenyReason::UnrecognizedRole)
        } else {
            Self::Validation(ValidationKind::UnknownLabel(err))
        }
    }
}

/// Result alias
pub type BrdResult<T> = Result<T, BrdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflict_is_retryable() {
        assert!(BrdError::Conflict("x".into()).is_retryable());
        assert!(!BrdError::Validation(ValidationKind::SameState(LifecycleState::Draft)).is_retryable());
        assert!(!BrdError::AccessDenied(DenyReason::AlreadySubmitted).is_retryable());
    }

    #[test]
    fn comment_errors_map_to_categories() {
        let key = CommentGroupKey::document("d1", "scope", "budget");
        let cases = [
            (
                CommentError::LimitExceeded {
                    user_type: UserType::Ba,
                    limit: 5,
                },
                ErrorCategory::Validation,
            ),
            (
                CommentError::TypeMismatch {
                    expected: FieldType::Number,
                    staged: FieldType::Text,
                },
                ErrorCategory::Validation,
            ),
            (CommentError::GroupNotFound(key.clone()), ErrorCategory::NotFound),
            (
                CommentError::InvalidParent {
                    parent: EntryId::new(),
                },
                ErrorCategory::NotFound,
            ),
            (CommentError::PromotionConflict(key), ErrorCategory::Conflict),
            (CommentError::Forbidden("no".into()), ErrorCategory::AccessDenied),
            (
                CommentError::Store(StoreError::Unavailable("down".into())),
                ErrorCategory::Unexpected,
            ),
        ];
        for (err, category) in cases {
            assert_eq!(BrdError::from(err).category(), category);
        }
    }

    #[test]
    fn comment_validation_keeps_its_kind() {
        let key = CommentGroupKey::document("d1", "scope", "budget");
        let cases = [
            (
                CommentError::LimitExceeded {
                    user_type: UserType::Pm,
                    limit: 5,
                },
                ValidationKind::LimitExceeded {
                    user_type: UserType::Pm,
                    limit: 5,
                },
            ),
            (
                CommentError::TypeMismatch {
                    expected: FieldType::Number,
                    staged: FieldType::Text,
                },
                ValidationKind::TypeMismatch {
                    expected: FieldType::Number,
                    staged: FieldType::Text,
                },
            ),
            (
                CommentError::ValueTypeMismatch(FieldType::Date),
                ValidationKind::ValueTypeMismatch(FieldType::Date),
            ),
            (
                CommentError::NoShadowValue(key.clone()),
                ValidationKind::NoShadowValue(key),
            ),
            (
                CommentError::InvalidText("empty".into()),
                ValidationKind::InvalidText("empty".into()),
            ),
        ];
        for (err, kind) in cases {
            let text = err.to_string();
            let mapped = BrdError::from(err);
            assert_eq!(mapped.validation_kind(), Some(&kind));
            assert!(mapped.to_string().ends_with(&text));
        }
    }

    #[test]
    fn role_not_held_is_typed() {
        let err = BrdError::from(AssignmentError::RoleNotHeld {
            identity: Identity::new("ba-2"),
            kind: CollaboratorKind::ProjectManager,
        });
        assert_eq!(
            err.validation_kind(),
            Some(&ValidationKind::RoleNotHeld {
                identity: Identity::new("ba-2"),
                kind: CollaboratorKind::ProjectManager,
            })
        );
        assert_eq!(err.to_string(), "validation failed: ba-2 is not a PM");
    }

    #[test]
    fn unknown_state_label_is_validation() {
        let err: BrdError = "Archived".parse::<LifecycleState>().unwrap_err().into();
        assert!(matches!(
            err.validation_kind(),
            Some(ValidationKind::UnknownLabel(e)) if e.label == "Archived"
        ));
    }

    #[test]
    fn zero_config_limit_is_validation() {
        let err = BrdError::from(ConfigError::Zero("max_comment_length"));
        assert_eq!(
            err.validation_kind(),
            Some(&ValidationKind::ZeroLimit("max_comment_length"))
        );
    }

    #[test]
    fn unexpected_hides_detail() {
        let err = BrdError::from(StoreError::Corrupt("secret table xyz".into()));
        assert!(!err.to_string().contains("secret"));
        assert_eq!(err.category(), ErrorCategory::Unexpected);
    }

    #[test]
    fn unknown_role_label_is_access_denied() {
        let err: BrdError = "ROLE_GUEST".parse::<brd_types::Role>().unwrap_err().into();
        assert_eq!(err.deny_reason(), Some(DenyReason::UnrecognizedRole));
    }
}
