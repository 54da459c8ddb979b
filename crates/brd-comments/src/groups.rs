//! Comment group store

use crate::error::{CommentError, CommentResult};
use crate::filter::{CommentFilter, GroupStats};
use brd_store::{AppendOutcome, CommentStore, ReadOutcome, StoreError};
use brd_types::{
    CommentEntry, CommentGroup, CommentGroupKey, DocumentId, EntityKind, EntryId, GroupStatus,
    Identity,
};
use std::sync::Arc;
use tracing::debug;

/// Entries one user type may add to one group
pub const DEFAULT_COMMENT_LIMIT: usize = 5;

/// Longest accepted comment text, in characters
pub const DEFAULT_MAX_COMMENT_LENGTH: usize = 4000;

/// Groups of comments anchored to one field each
///
/// Appends go through the store's conditional append so that the per-user-type
/// cap holds under concurrent callers.
#[derive(Clone)]
pub struct CommentGroupStore {
    store: Arc<dyn CommentStore>,
    limit: usize,
    max_length: usize,
}

impl std::fmt::Debug for CommentGroupStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentGroupStore")
            .field("limit", &self.limit)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

impl CommentGroupStore {
    /// Create store with default limits
    #[must_use]
    pub fn new(store: Arc<dyn CommentStore>) -> Self {
        Self {
            store,
            limit: DEFAULT_COMMENT_LIMIT,
            max_length: DEFAULT_MAX_COMMENT_LENGTH,
        }
    }

    /// Set the per-user-type entry cap
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the maximum comment length
    #[inline]
    #[must_use]
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Configured per-user-type cap
    #[inline]
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Create the group, or update the status of the existing one
    ///
    /// # Errors
    /// `MalformedKey` for an invalid key; store failures.
    pub async fn create_or_update_group(
        &self,
        key: &CommentGroupKey,
        status: GroupStatus,
        created_by: &Identity,
    ) -> CommentResult<CommentGroup> {
        key.validate()?;
        let (group, created) = self.store.upsert_group(key, status, created_by).await?;
        debug!(group = %key, %status, created, "comment group upserted");
        Ok(group)
    }

    /// Load a group
    ///
    /// # Errors
    /// `GroupNotFound` when absent.
    pub async fn get_group(&self, key: &CommentGroupKey) -> CommentResult<CommentGroup> {
        self.store
            .get_group(key)
            .await?
            .ok_or_else(|| CommentError::GroupNotFound(key.clone()))
    }

    /// Append an entry to an existing group
    ///
    /// Nothing is stored when any check fails.
    ///
    /// # Errors
    /// `MalformedKey`, `InvalidText`, `GroupNotFound`, `InvalidParent`, or
    /// `LimitExceeded` when the author's user type already holds the cap.
    pub async fn add_comment(
        &self,
        key: &CommentGroupKey,
        entry: CommentEntry,
    ) -> CommentResult<CommentEntry> {
        key.validate()?;
        self.check_text(&entry.text)?;
        let user_type = entry.user_type;
        let parent = entry.parent;

        match self.store.append_entry(key, entry, self.limit).await? {
            AppendOutcome::Appended(entry) => {
                debug!(group = %key, entry_id = %entry.id, %user_type, "comment appended");
                Ok(entry)
            }
            AppendOutcome::GroupMissing => Err(CommentError::GroupNotFound(key.clone())),
            AppendOutcome::ParentMissing => Err(parent.map_or_else(
                || StoreError::Corrupt(format!("root entry on {key} reported a missing parent")).into(),
                |parent| CommentError::InvalidParent { parent },
            )),
            AppendOutcome::LimitReached { existing } => {
                debug!(group = %key, %user_type, existing, limit = self.limit, "comment limit reached");
                Err(CommentError::LimitExceeded {
                    user_type,
                    limit: self.limit,
                })
            }
        }
    }

    /// Set the discussion status of an existing group
    ///
    /// # Errors
    /// `GroupNotFound` when absent.
    pub async fn set_status(
        &self,
        key: &CommentGroupKey,
        status: GroupStatus,
    ) -> CommentResult<CommentGroup> {
        self.store
            .set_status(key, status)
            .await?
            .ok_or_else(|| CommentError::GroupNotFound(key.clone()))
    }

    /// Record that `reader` has read an entry
    ///
    /// Returns `true` when the reader was newly recorded, `false` when already
    /// present.
    ///
    /// # Errors
    /// `GroupNotFound` or `EntryNotFound`.
    pub async fn update_read_status(
        &self,
        key: &CommentGroupKey,
        entry_id: EntryId,
        reader: &Identity,
    ) -> CommentResult<bool> {
        match self.store.mark_read(key, entry_id, reader).await? {
            ReadOutcome::Inserted => Ok(true),
            ReadOutcome::AlreadyRead => Ok(false),
            ReadOutcome::GroupMissing => Err(CommentError::GroupNotFound(key.clone())),
            ReadOutcome::EntryMissing => Err(CommentError::EntryNotFound(entry_id)),
        }
    }

    /// Groups matching `filter`, ordered by key
    ///
    /// # Errors
    /// Store failures.
    pub async fn list_comments(&self, filter: &CommentFilter) -> CommentResult<Vec<CommentGroup>> {
        let mut groups: Vec<_> = self
            .store
            .list_groups(&filter.document_id)
            .await?
            .into_iter()
            .filter(|g| filter.matches(g))
            .collect();
        groups.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(groups)
    }

    /// Counts for the groups of a document in one status
    ///
    /// # Errors
    /// Store failures.
    pub async fn group_stats(
        &self,
        document_id: &DocumentId,
        status: GroupStatus,
    ) -> CommentResult<GroupStats> {
        let groups = self.store.list_groups(document_id).await?;
        Ok(GroupStats::tally(document_id.clone(), status, &groups))
    }

    /// Groups anchored to one entity kind, optionally in one status
    ///
    /// # Errors
    /// Store failures.
    pub async fn groups_by_source(
        &self,
        document_id: &DocumentId,
        entity_kind: EntityKind,
        status: Option<GroupStatus>,
    ) -> CommentResult<Vec<CommentGroup>> {
        let mut filter = CommentFilter::for_document(document_id.clone()).with_entity_kind(entity_kind);
        filter.status = status;
        self.list_comments(&filter).await
    }

    /// Entries of a document neither written nor read by `reader`
    ///
    /// # Errors
    /// Store failures.
    pub async fn unread_count(
        &self,
        document_id: &DocumentId,
        reader: &Identity,
    ) -> CommentResult<usize> {
        let groups = self.store.list_groups(document_id).await?;
        Ok(groups
            .iter()
            .flat_map(|g| g.entries.iter())
            .filter(|e| e.author != *reader && !e.read_by.contains(reader))
            .count())
    }

    fn check_text(&self, text: &str) -> CommentResult<()> {
        if text.trim().is_empty() {
            return Err(CommentError::InvalidText("comment text is empty".to_string()));
        }
        let length = text.chars().count();
        if length > self.max_length {
            return Err(CommentError::InvalidText(format!(
                "comment is {length} characters, at most {} allowed",
                self.max_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brd_store::MemoryStore;
    use brd_types::UserType;
    use futures::future::join_all;

    fn setup() -> (Arc<MemoryStore>, CommentGroupStore) {
        let store = Arc::new(MemoryStore::new());
        let groups = CommentGroupStore::new(store.clone());
        (store, groups)
    }

    fn key() -> CommentGroupKey {
        CommentGroupKey::document("d1", "scope", "summary")
    }

    #[tokio::test]
    async fn upsert_keeps_entries_and_updates_status() {
        let (_, groups) = setup();
        let ba = Identity::new("ba-1");
        groups.create_or_update_group(&key(), GroupStatus::Pending, &ba).await.unwrap();
        groups
            .add_comment(&key(), CommentEntry::new("ba-1", UserType::Ba, "first"))
            .await
            .unwrap();

        let group = groups
            .create_or_update_group(&key(), GroupStatus::Resolved, &ba)
            .await
            .unwrap();
        assert_eq!(group.status, GroupStatus::Resolved);
        assert_eq!(group.entries.len(), 1);
    }

    #[tokio::test]
    async fn malformed_key_rejected() {
        let (_, groups) = setup();
        let bad = CommentGroupKey::document("d1", "", "summary");
        let err = groups
            .create_or_update_group(&bad, GroupStatus::Pending, &Identity::new("ba-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::MalformedKey(_)));
    }

    #[tokio::test]
    async fn sixth_comment_per_user_type_rejected() {
        let (store, groups) = setup();
        groups
            .create_or_update_group(&key(), GroupStatus::Pending, &Identity::new("ba-1"))
            .await
            .unwrap();
        for i in 0..5 {
            groups
                .add_comment(&key(), CommentEntry::new("ba-1", UserType::Ba, format!("c{i}")))
                .await
                .unwrap();
        }
        let err = groups
            .add_comment(&key(), CommentEntry::new("ba-2", UserType::Ba, "sixth"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CommentError::LimitExceeded {
                user_type: UserType::Ba,
                limit: 5
            }
        ));
        // other user types keep their own quota
        groups
            .add_comment(&key(), CommentEntry::new("rev-1", UserType::Reviewer, "ok"))
            .await
            .unwrap();
        let group = store.get_group(&key()).await.unwrap().unwrap();
        assert_eq!(group.count_for(UserType::Ba), 5);
        assert_eq!(group.entries.len(), 6);
    }

    #[tokio::test]
    async fn reply_needs_parent_in_same_group() {
        let (_, groups) = setup();
        let ba = Identity::new("ba-1");
        let other = CommentGroupKey::document("d1", "scope", "other");
        groups.create_or_update_group(&key(), GroupStatus::Pending, &ba).await.unwrap();
        groups.create_or_update_group(&other, GroupStatus::Pending, &ba).await.unwrap();
        let root = groups
            .add_comment(&other, CommentEntry::new("ba-1", UserType::Ba, "root"))
            .await
            .unwrap();

        let err = groups
            .add_comment(&key(), CommentEntry::new("ba-1", UserType::Ba, "reply").reply_to(root.id))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::InvalidParent { parent } if parent == root.id));

        groups
            .add_comment(&other, CommentEntry::new("ba-1", UserType::Ba, "reply").reply_to(root.id))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn text_length_checked() {
        let (_, groups) = setup();
        let groups = groups.with_max_length(10);
        groups
            .create_or_update_group(&key(), GroupStatus::Pending, &Identity::new("ba-1"))
            .await
            .unwrap();
        for text in ["   ", "this is longer than ten"] {
            let err = groups
                .add_comment(&key(), CommentEntry::new("ba-1", UserType::Ba, text))
                .await
                .unwrap_err();
            assert!(matches!(err, CommentError::InvalidText(_)));
        }
    }

    #[tokio::test]
    async fn missing_group() {
        let (_, groups) = setup();
        let err = groups
            .add_comment(&key(), CommentEntry::new("ba-1", UserType::Ba, "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommentError::GroupNotFound(_)));
        assert!(matches!(
            groups.set_status(&key(), GroupStatus::Resolved).await,
            Err(CommentError::GroupNotFound(_))
        ));
    }

    #[tokio::test]
    async fn read_status_is_idempotent() {
        let (_, groups) = setup();
        let rev = Identity::new("rev-1");
        groups
            .create_or_update_group(&key(), GroupStatus::Pending, &Identity::new("ba-1"))
            .await
            .unwrap();
        let entry = groups
            .add_comment(&key(), CommentEntry::new("ba-1", UserType::Ba, "x"))
            .await
            .unwrap();

        assert_eq!(groups.unread_count(&key().document_id, &rev).await.unwrap(), 1);
        assert!(groups.update_read_status(&key(), entry.id, &rev).await.unwrap());
        assert!(!groups.update_read_status(&key(), entry.id, &rev).await.unwrap());
        assert_eq!(groups.unread_count(&key().document_id, &rev).await.unwrap(), 0);
        assert!(matches!(
            groups.update_read_status(&key(), EntryId::new(), &rev).await,
            Err(CommentError::EntryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn projections() {
        let (_, groups) = setup();
        let ba = Identity::new("ba-1");
        let site = CommentGroupKey::sub_entity("d1", "site-1", "power", "voltage");
        groups.create_or_update_group(&key(), GroupStatus::Pending, &ba).await.unwrap();
        groups.create_or_update_group(&site, GroupStatus::Resolved, &ba).await.unwrap();
        groups
            .add_comment(&site, CommentEntry::new("ba-1", UserType::Ba, "x"))
            .await
            .unwrap();

        let listed = groups.list_comments(&CommentFilter::for_document("d1")).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, key());

        let by_source = groups
            .groups_by_source(&key().document_id, EntityKind::SubEntity, None)
            .await
            .unwrap();
        assert_eq!(by_source.len(), 1);
        assert!(groups
            .groups_by_source(&key().document_id, EntityKind::SubEntity, Some(GroupStatus::Pending))
            .await
            .unwrap()
            .is_empty());

        let stats = groups
            .group_stats(&key().document_id, GroupStatus::Resolved)
            .await
            .unwrap();
        assert_eq!(stats.group_count, 1);
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.sub_entity_groups, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_all_land() {
        let (store, groups) = setup();
        let groups = groups.with_limit(usize::MAX);
        groups
            .create_or_update_group(&key(), GroupStatus::Pending, &Identity::new("ba-1"))
            .await
            .unwrap();

        let tasks = (0..50).map(|i| {
            let groups = groups.clone();
            tokio::spawn(async move {
                groups
                    .add_comment(&key(), CommentEntry::new(format!("rev-{i}"), UserType::Reviewer, "x"))
                    .await
            })
        });
        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let group = store.get_group(&key()).await.unwrap().unwrap();
        assert_eq!(group.entries.len(), 50);
        let ids: std::collections::HashSet<_> = group.entries.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 50);
    }
}
