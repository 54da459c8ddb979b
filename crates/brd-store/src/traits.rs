//! Persistence ports

use crate::error::StoreResult;
use async_trait::async_trait;
use brd_types::{
    Assignment, CollaboratorKind, CommentEntry, CommentGroup, CommentGroupKey, Document,
    DocumentId, EntryId, FieldTarget, FieldType, GroupStatus, Identity, LifecycleState, Role,
    ShadowValue,
};

/// Document snapshots and lifecycle updates
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document snapshot
    async fn get_document(&self, id: &DocumentId) -> StoreResult<Option<Document>>;

    /// Move `id` from `expected` to `new`
    ///
    /// Returns `false`, without mutating, when the stored state is no longer
    /// `expected` or the document does not exist.
    async fn cas_update_state(
        &self,
        id: &DocumentId,
        expected: LifecycleState,
        new: LifecycleState,
    ) -> StoreResult<bool>;
}

/// What an assignment upsert did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentChange {
    /// No prior active assignment of this kind
    Created,
    /// Same identity re-assigned; timestamp refreshed
    Refreshed,
    /// A different identity was active and is now superseded
    Superseded {
        /// Identity that lost the assignment
        previous: Identity,
    },
}

/// Assignment records
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Atomically make `identity` the active assignee for (document, kind)
    async fn upsert_active(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
        identity: &Identity,
    ) -> StoreResult<AssignmentChange>;

    /// Currently active assignment
    async fn active(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
    ) -> StoreResult<Option<Assignment>>;

    /// All assignments, oldest first, including superseded ones
    async fn history(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
    ) -> StoreResult<Vec<Assignment>>;
}

/// Outcome of a conditional append
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Stored
    Appended(CommentEntry),
    /// No group under this key
    GroupMissing,
    /// `parent` does not name an entry of this group
    ParentMissing,
    /// The author's quota category already holds `limit` entries
    LimitReached {
        /// Entries of that category at the time of the check
        existing: usize,
    },
}

/// Outcome of a read-receipt insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Reader newly recorded
    Inserted,
    /// Reader was already recorded
    AlreadyRead,
    /// No group under this key
    GroupMissing,
    /// No entry with that ID in the group
    EntryMissing,
}

/// Outcome of a promotion claim
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// The caller owns the promotion; `revision` is needed to release it
    Claimed {
        /// Shadow value as it was claimed
        shadow: ShadowValue,
        /// Group revision after the claim
        revision: u64,
    },
    /// No group under this key
    GroupMissing,
    /// The shadow changed, was already promoted, or was never staged
    Stale,
}

/// Comment groups and their entries
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Create the group, or update its status if it exists
    ///
    /// Entries of an existing group are left untouched. The flag is `true`
    /// when the group was created by this call.
    async fn upsert_group(
        &self,
        key: &CommentGroupKey,
        status: GroupStatus,
        created_by: &Identity,
    ) -> StoreResult<(CommentGroup, bool)>;

    /// Load a group with its entries
    async fn get_group(&self, key: &CommentGroupKey) -> StoreResult<Option<CommentGroup>>;

    /// Append `entry` if its author's category holds fewer than `limit` entries
    ///
    /// The count and the parent reference are checked inside the same atomic
    /// step that stores the entry.
    async fn append_entry(
        &self,
        key: &CommentGroupKey,
        entry: CommentEntry,
        limit: usize,
    ) -> StoreResult<AppendOutcome>;

    /// Set the status of an existing group
    async fn set_status(
        &self,
        key: &CommentGroupKey,
        status: GroupStatus,
    ) -> StoreResult<Option<CommentGroup>>;

    /// Add `reader` to an entry's read set
    async fn mark_read(
        &self,
        key: &CommentGroupKey,
        entry_id: EntryId,
        reader: &Identity,
    ) -> StoreResult<ReadOutcome>;

    /// Replace the staged value and bump the group revision
    ///
    /// Returns the new revision, or `None` when the group does not exist.
    async fn stage_shadow(
        &self,
        key: &CommentGroupKey,
        shadow: ShadowValue,
    ) -> StoreResult<Option<u64>>;

    /// Mark the shadow promoted if the group is still at `expected_revision`
    async fn claim_shadow(
        &self,
        key: &CommentGroupKey,
        expected_revision: u64,
        promoted_by: &Identity,
    ) -> StoreResult<ClaimOutcome>;

    /// Undo a claim made at `revision`; `false` if the group moved on since
    async fn release_shadow(&self, key: &CommentGroupKey, revision: u64) -> StoreResult<bool>;

    /// All groups of a document
    async fn list_groups(&self, document_id: &DocumentId) -> StoreResult<Vec<CommentGroup>>;
}

/// Canonical field values of documents and sub-entities
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Declared type of a field; `None` when the entity or field is unknown
    async fn field_type(&self, target: &FieldTarget) -> StoreResult<Option<FieldType>>;

    /// Current value of a field
    async fn read_field(&self, target: &FieldTarget) -> StoreResult<Option<serde_json::Value>>;

    /// Overwrite a field value
    async fn write_field(&self, target: &FieldTarget, value: serde_json::Value)
        -> StoreResult<()>;
}

/// Role membership lookup
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Whether `identity` holds `role`
    async fn holds_role(&self, identity: &Identity, role: Role) -> StoreResult<bool>;
}
