//! Comment errors

use brd_store::StoreError;
use brd_types::{CommentGroupKey, EntryId, FieldType, KeyError, UserType};

/// Comment and shadow-value failure
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    /// No group under this key
    #[error("comment group not found: {0}")]
    GroupNotFound(CommentGroupKey),

    /// Reply parent is not an entry of the group
    #[error("invalid parent entry {parent}")]
    InvalidParent {
        /// Parent the reply referenced
        parent: EntryId,
    },

    /// No entry with this ID in the group
    #[error("comment entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Quota for the user type is used up
    #[error("comment limit of {limit} reached for {user_type}")]
    LimitExceeded {
        /// Author category
        user_type: UserType,
        /// Configured cap
        limit: usize,
    },

    /// Comment text is empty or too long
    #[error("invalid comment text: {0}")]
    InvalidText(String),

    /// Staged type tag does not match the target field's declared type
    #[error("shadow value is {staged} but the field is {expected}")]
    TypeMismatch {
        /// Declared type of the field
        expected: FieldType,
        /// Type tag of the staged value
        staged: FieldType,
    },

    /// Staged JSON value is not an instance of its own type tag
    #[error("value is not a valid {0}")]
    ValueTypeMismatch(FieldType),

    /// Target field of the group is not defined on the entity
    #[error("field not found: {0}")]
    FieldNotFound(CommentGroupKey),

    /// Group has nothing staged
    #[error("no shadow value staged on {0}")]
    NoShadowValue(CommentGroupKey),

    /// Requester may not perform the operation
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Another promotion won, or the shadow changed under us
    #[error("promotion conflict on {0}")]
    PromotionConflict(CommentGroupKey),

    /// Key failed validation
    #[error("malformed group key: {0}")]
    MalformedKey(#[from] KeyError),

    /// Backing store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommentError {
    /// Whether the failure is a lost race rather than a rejected request
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, CommentError::PromotionConflict(_))
    }
}

/// Result alias
pub type CommentResult<T> = Result<T, CommentError>;
