//! Shadow value staging and promotion

use crate::error::{CommentError, CommentResult};
use brd_store::{ClaimOutcome, CommentStore, EntityStore, StoreError};
use brd_types::{CommentGroupKey, FieldTarget, FieldType, Identity, Role, ShadowValue};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a successful promotion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Promotion {
    /// Field that was written
    pub target: FieldTarget,
    /// Value written
    pub value: serde_json::Value,
    /// Value the field held before
    pub previous: Option<serde_json::Value>,
    /// Group revision after the promotion
    pub revision: u64,
}

/// Stages provisional field values and promotes them into the canonical record
///
/// Promotion is single-writer per group: the shadow is claimed with a
/// compare-and-swap on the group revision before the field is written.
#[derive(Clone)]
pub struct ShadowValueStager {
    comments: Arc<dyn CommentStore>,
    entities: Arc<dyn EntityStore>,
}

impl std::fmt::Debug for ShadowValueStager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowValueStager").finish_non_exhaustive()
    }
}

impl ShadowValueStager {
    /// Create stager
    #[must_use]
    pub fn new(comments: Arc<dyn CommentStore>, entities: Arc<dyn EntityStore>) -> Self {
        Self { comments, entities }
    }

    /// Stage `value` on the group, replacing any earlier shadow
    ///
    /// Returns the new group revision.
    ///
    /// # Errors
    /// `MalformedKey`, `ValueTypeMismatch` when `value` is not a `type_tag`,
    /// `GroupNotFound`.
    pub async fn stage(
        &self,
        key: &CommentGroupKey,
        value: serde_json::Value,
        type_tag: FieldType,
        staged_by: &Identity,
    ) -> CommentResult<u64> {
        key.validate()?;
        if !type_tag.admits(&value) {
            return Err(CommentError::ValueTypeMismatch(type_tag));
        }
        let shadow = ShadowValue::new(value, type_tag, staged_by.clone());
        let revision = self
            .comments
            .stage_shadow(key, shadow)
            .await?
            .ok_or_else(|| CommentError::GroupNotFound(key.clone()))?;
        debug!(group = %key, %type_tag, revision, "shadow value staged");
        Ok(revision)
    }

    /// Promote the group's staged value into the target field
    ///
    /// Only the creator role may promote. On a type mismatch nothing is
    /// written; if the field write fails the claim is released.
    ///
    /// # Errors
    /// `Forbidden`, `GroupNotFound`, `NoShadowValue`, `FieldNotFound`,
    /// `TypeMismatch`, `PromotionConflict` when another promotion won or the
    /// shadow was restaged, store failures.
    pub async fn promote(
        &self,
        key: &CommentGroupKey,
        requester: Role,
        promoted_by: &Identity,
    ) -> CommentResult<Promotion> {
        if requester != Role::BusinessAnalyst {
            return Err(CommentError::Forbidden(format!(
                "{requester} may not promote shadow values"
            )));
        }

        let group = self
            .comments
            .get_group(key)
            .await?
            .ok_or_else(|| CommentError::GroupNotFound(key.clone()))?;
        let shadow = match &group.shadow {
            None => return Err(CommentError::NoShadowValue(key.clone())),
            Some(shadow) if !shadow.is_pending() => {
                return Err(CommentError::PromotionConflict(key.clone()))
            }
            Some(shadow) => shadow,
        };

        let target = key.target();
        let expected = self
            .entities
            .field_type(&target)
            .await?
            .ok_or_else(|| CommentError::FieldNotFound(key.clone()))?;
        if expected != shadow.type_tag {
            return Err(CommentError::TypeMismatch {
                expected,
                staged: shadow.type_tag,
            });
        }

        let (shadow, revision) = match self
            .comments
            .claim_shadow(key, group.shadow_revision, promoted_by)
            .await?
        {
            ClaimOutcome::Claimed { shadow, revision } => (shadow, revision),
            ClaimOutcome::GroupMissing => return Err(CommentError::GroupNotFound(key.clone())),
            ClaimOutcome::Stale => return Err(CommentError::PromotionConflict(key.clone())),
        };

        let previous = match self.apply(&target, shadow.value.clone()).await {
            Ok(previous) => previous,
            Err(err) => {
                warn!(group = %key, error = %err, revision, "field write failed after claim");
                match self.comments.release_shadow(key, revision).await {
                    Ok(released) => debug!(group = %key, released, "promotion claim released"),
                    Err(release_err) => warn!(
                        group = %key,
                        error = %release_err,
                        revision,
                        "promotion claim could not be released"
                    ),
                }
                return Err(err.into());
            }
        };

        Ok(Promotion {
            target,
            value: shadow.value,
            previous,
            revision,
        })
    }

    /// Write `value`, returning what the field held before
    async fn apply(
        &self,
        target: &FieldTarget,
        value: serde_json::Value,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let previous = self.entities.read_field(target).await?;
        self.entities.write_field(target, value).await?;
        Ok(previous)
    }
}
