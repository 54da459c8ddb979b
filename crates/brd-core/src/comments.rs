//! Field discussion use cases

use crate::error::{BrdError, BrdResult};
use crate::orchestrator::{denied, Orchestrator};
use brd_comments::{CommentFilter, GroupStats, Promotion};
use brd_policy::DenyReason;
use brd_types::{
    Caller, CommentEntry, CommentGroup, CommentGroupKey, DocumentId, EntityKind, EntryId,
    FieldType, GroupStatus,
};
use tracing::info;

impl Orchestrator {
    /// Create a comment group on a field, or update the status of the existing one
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`, `Validation` for a malformed key.
    pub async fn open_group(
        &self,
        caller: &Caller,
        key: &CommentGroupKey,
        status: GroupStatus,
    ) -> BrdResult<CommentGroup> {
        self.authorize_comment(caller, &key.document_id).await?;
        let group = self
            .groups
            .create_or_update_group(key, status, &caller.identity)
            .await?;
        info!(group = %key, identity = %caller.identity, %status, "comment group opened");
        Ok(group)
    }

    /// Load one group with its entries
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`.
    pub async fn get_group(&self, caller: &Caller, key: &CommentGroupKey) -> BrdResult<CommentGroup> {
        self.authorize_comment(caller, &key.document_id).await?;
        Ok(self.groups.get_group(key).await?)
    }

    /// Append a comment, optionally as a reply to an entry of the same group
    ///
    /// The caller's user type is charged against the group's quota. The
    /// group status is left as it was.
    ///
    /// # Errors
    /// `NotFound` for a missing group or parent, `AccessDenied`,
    /// `Validation` when the quota is used up or the text is rejected.
    pub async fn add_comment(
        &self,
        caller: &Caller,
        key: &CommentGroupKey,
        text: impl Into<String>,
        parent: Option<EntryId>,
    ) -> BrdResult<CommentEntry> {
        let document = self.authorize_comment(caller, &key.document_id).await?;
        let Some(user_type) = caller.user_type() else {
            return Err(denied(
                caller,
                &document,
                BrdError::AccessDenied(DenyReason::OversightExcludedFromComments),
            ));
        };

        let mut entry = CommentEntry::new(caller.identity.clone(), user_type, text);
        if let Some(parent) = parent {
            entry = entry.reply_to(parent);
        }
        let entry = self.groups.add_comment(key, entry).await?;
        info!(
            group = %key,
            entry_id = %entry.id,
            identity = %caller.identity,
            %user_type,
            "comment added"
        );
        Ok(entry)
    }

    /// Set the discussion status of a group
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`.
    pub async fn set_group_status(
        &self,
        caller: &Caller,
        key: &CommentGroupKey,
        status: GroupStatus,
    ) -> BrdResult<CommentGroup> {
        self.authorize_comment(caller, &key.document_id).await?;
        let group = self.groups.set_status(key, status).await?;
        info!(group = %key, identity = %caller.identity, %status, "comment group status set");
        Ok(group)
    }

    /// Stage a provisional value for the group's field
    ///
    /// Returns the group revision after staging.
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`, `Validation` when `value` is not a
    /// `type_tag`.
    pub async fn stage_shadow_value(
        &self,
        caller: &Caller,
        key: &CommentGroupKey,
        value: serde_json::Value,
        type_tag: FieldType,
    ) -> BrdResult<u64> {
        self.authorize_comment(caller, &key.document_id).await?;
        let revision = self
            .stager
            .stage(key, value, type_tag, &caller.identity)
            .await?;
        info!(group = %key, identity = %caller.identity, %type_tag, revision, "shadow value staged");
        Ok(revision)
    }

    /// Promote the group's staged value into the canonical record
    ///
    /// # Errors
    /// `AccessDenied` unless the caller is the document's creator,
    /// `NotFound`, `Validation` on a type mismatch (nothing written),
    /// `Conflict` when a concurrent promotion won.
    pub async fn promote_shadow_value(
        &self,
        caller: &Caller,
        key: &CommentGroupKey,
    ) -> BrdResult<Promotion> {
        let document = self.authorize_comment(caller, &key.document_id).await?;
        let promotion = self
            .stager
            .promote(key, caller.role, &caller.identity)
            .await
            .map_err(|e| denied(caller, &document, e.into()))?;
        info!(
            group = %key,
            identity = %caller.identity,
            revision = promotion.revision,
            "shadow value promoted"
        );
        Ok(promotion)
    }

    /// Record that the caller has read an entry
    ///
    /// Returns `true` when newly recorded, `false` when already read.
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`.
    pub async fn mark_read(
        &self,
        caller: &Caller,
        key: &CommentGroupKey,
        entry_id: EntryId,
    ) -> BrdResult<bool> {
        self.authorize_comment(caller, &key.document_id).await?;
        Ok(self
            .groups
            .update_read_status(key, entry_id, &caller.identity)
            .await?)
    }

    /// Groups of a document matching `filter`
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`.
    pub async fn list_comments(
        &self,
        caller: &Caller,
        filter: &CommentFilter,
    ) -> BrdResult<Vec<CommentGroup>> {
        self.authorize_comment(caller, &filter.document_id).await?;
        Ok(self.groups.list_comments(filter).await?)
    }

    /// Group and entry counts for one status
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`.
    pub async fn group_stats(
        &self,
        caller: &Caller,
        document_id: &DocumentId,
        status: GroupStatus,
    ) -> BrdResult<GroupStats> {
        self.authorize_comment(caller, document_id).await?;
        Ok(self.groups.group_stats(document_id, status).await?)
    }

    /// Groups anchored to one entity kind
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`.
    pub async fn groups_by_source(
        &self,
        caller: &Caller,
        document_id: &DocumentId,
        entity_kind: EntityKind,
        status: Option<GroupStatus>,
    ) -> BrdResult<Vec<CommentGroup>> {
        self.authorize_comment(caller, document_id).await?;
        Ok(self
            .groups
            .groups_by_source(document_id, entity_kind, status)
            .await?)
    }

    /// Entries on the document the caller neither wrote nor read
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`.
    pub async fn unread_count(&self, caller: &Caller, document_id: &DocumentId) -> BrdResult<usize> {
        self.authorize_comment(caller, document_id).await?;
        Ok(self.groups.unread_count(document_id, &caller.identity).await?)
    }
}
