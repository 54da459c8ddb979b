//! In-memory store adapter
//!
//! Each conditional write runs while holding the DashMap shard lock for its
//! key, which makes the check and the write one atomic step.

use crate::error::{StoreError, StoreResult};
use crate::traits::{
    AppendOutcome, AssignmentChange, AssignmentStore, ClaimOutcome, CommentStore,
    DocumentStore, EntityStore, IdentityDirectory, ReadOutcome,
};
use async_trait::async_trait;
use brd_types::{
    Assignment, CollaboratorKind, CommentEntry, CommentGroup, CommentGroupKey, Document,
    DocumentId, EntryId, FieldTarget, FieldType, GroupStatus, Identity, LifecycleState, Role,
    ShadowValue,
};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
struct FieldSlot {
    field_type: FieldType,
    value: serde_json::Value,
}

/// In-process implementation of every store port
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<DocumentId, Document>,
    assignments: DashMap<(DocumentId, CollaboratorKind), Vec<Assignment>>,
    groups: DashMap<CommentGroupKey, CommentGroup>,
    fields: DashMap<FieldTarget, FieldSlot>,
    directory: RwLock<HashMap<Identity, BTreeSet<Role>>>,
    fail_field_writes: AtomicBool,
    fail_shadow_releases: AtomicBool,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document
    pub fn insert_document(&self, document: Document) {
        self.documents.insert(document.id.clone(), document);
    }

    /// Snapshot of a document
    #[must_use]
    pub fn document(&self, id: &DocumentId) -> Option<Document> {
        self.documents.get(id).map(|d| d.clone())
    }

    /// Grant a role to an identity
    pub fn grant_role(&self, identity: impl Into<Identity>, role: Role) {
        self.directory
            .write()
            .entry(identity.into())
            .or_default()
            .insert(role);
    }

    /// Declare a canonical field with its type and initial value
    pub fn define_field(&self, target: FieldTarget, field_type: FieldType, value: serde_json::Value) {
        self.fields.insert(target, FieldSlot { field_type, value });
    }

    /// Make every subsequent field write fail (fault injection)
    pub fn fail_field_writes(&self, fail: bool) {
        self.fail_field_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent shadow release fail (fault injection)
    pub fn fail_shadow_releases(&self, fail: bool) {
        self.fail_shadow_releases.store(fail, Ordering::SeqCst);
    }

    /// Number of stored groups
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        Ok(self.documents.get(id).map(|d| d.clone()))
    }

    async fn cas_update_state(
        &self,
        id: &DocumentId,
        expected: LifecycleState,
        new: LifecycleState,
    ) -> StoreResult<bool> {
        let Some(mut document) = self.documents.get_mut(id) else {
            return Ok(false);
        };
        if document.state != expected {
            return Ok(false);
        }
        document.state = new;
        Ok(true)
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn upsert_active(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
        identity: &Identity,
    ) -> StoreResult<AssignmentChange> {
        let now = Utc::now();
        let mut records = self
            .assignments
            .entry((document_id.clone(), kind))
            .or_default();

        let change = match records.iter_mut().find(|a| a.active) {
            Some(current) if current.identity == *identity => {
                current.updated_at = now;
                return Ok(AssignmentChange::Refreshed);
            }
            Some(current) => {
                current.supersede(now);
                AssignmentChange::Superseded {
                    previous: current.identity.clone(),
                }
            }
            None => AssignmentChange::Created,
        };

        records.push(Assignment::new(document_id.clone(), kind, identity.clone()));
        Ok(change)
    }

    async fn active(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
    ) -> StoreResult<Option<Assignment>> {
        Ok(self
            .assignments
            .get(&(document_id.clone(), kind))
            .and_then(|records| records.iter().find(|a| a.active).cloned()))
    }

    async fn history(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
    ) -> StoreResult<Vec<Assignment>> {
        Ok(self
            .assignments
            .get(&(document_id.clone(), kind))
            .map(|records| records.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn upsert_group(
        &self,
        key: &CommentGroupKey,
        status: GroupStatus,
        created_by: &Identity,
    ) -> StoreResult<(CommentGroup, bool)> {
        match self.groups.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let group = occupied.get_mut();
                group.status = status;
                group.updated_at = Utc::now();
                Ok((group.clone(), false))
            }
            Entry::Vacant(vacant) => {
                let group = CommentGroup::new(key.clone(), status, created_by.clone());
                vacant.insert(group.clone());
                Ok((group, true))
            }
        }
    }

    async fn get_group(&self, key: &CommentGroupKey) -> StoreResult<Option<CommentGroup>> {
        Ok(self.groups.get(key).map(|g| g.clone()))
    }

    async fn append_entry(
        &self,
        key: &CommentGroupKey,
        entry: CommentEntry,
        limit: usize,
    ) -> StoreResult<AppendOutcome> {
        let Some(mut group) = self.groups.get_mut(key) else {
            return Ok(AppendOutcome::GroupMissing);
        };
        if let Some(parent) = entry.parent {
            if group.entry(parent).is_none() {
                return Ok(AppendOutcome::ParentMissing);
            }
        }
        let existing = group.count_for(entry.user_type);
        if existing >= limit {
            return Ok(AppendOutcome::LimitReached { existing });
        }
        group.entries.push(entry.clone());
        Ok(AppendOutcome::Appended(entry))
    }

    async fn set_status(
        &self,
        key: &CommentGroupKey,
        status: GroupStatus,
    ) -> StoreResult<Option<CommentGroup>> {
        Ok(self.groups.get_mut(key).map(|mut group| {
            group.status = status;
            group.updated_at = Utc::now();
            group.clone()
        }))
    }

    async fn mark_read(
        &self,
        key: &CommentGroupKey,
        entry_id: EntryId,
        reader: &Identity,
    ) -> StoreResult<ReadOutcome> {
        let Some(mut group) = self.groups.get_mut(key) else {
            return Ok(ReadOutcome::GroupMissing);
        };
        let Some(entry) = group.entries.iter_mut().find(|e| e.id == entry_id) else {
            return Ok(ReadOutcome::EntryMissing);
        };
        if entry.read_by.insert(reader.clone()) {
            Ok(ReadOutcome::Inserted)
        } else {
            Ok(ReadOutcome::AlreadyRead)
        }
    }

    async fn stage_shadow(
        &self,
        key: &CommentGroupKey,
        shadow: ShadowValue,
    ) -> StoreResult<Option<u64>> {
        Ok(self.groups.get_mut(key).map(|mut group| {
            group.shadow = Some(shadow);
            group.shadow_revision += 1;
            group.updated_at = Utc::now();
            group.shadow_revision
        }))
    }

    async fn claim_shadow(
        &self,
        key: &CommentGroupKey,
        expected_revision: u64,
        promoted_by: &Identity,
    ) -> StoreResult<ClaimOutcome> {
        let Some(mut group) = self.groups.get_mut(key) else {
            return Ok(ClaimOutcome::GroupMissing);
        };
        if group.shadow_revision != expected_revision || !group.has_pending_shadow() {
            return Ok(ClaimOutcome::Stale);
        }
        let Some(shadow) = group.shadow.as_mut() else {
            return Ok(ClaimOutcome::Stale);
        };
        shadow.promoted_at = Some(Utc::now());
        shadow.promoted_by = Some(promoted_by.clone());
        let shadow = shadow.clone();
        group.shadow_revision += 1;
        Ok(ClaimOutcome::Claimed {
            shadow,
            revision: group.shadow_revision,
        })
    }

    async fn release_shadow(&self, key: &CommentGroupKey, revision: u64) -> StoreResult<bool> {
        if self.fail_shadow_releases.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("shadow releases disabled".to_string()));
        }
        let Some(mut group) = self.groups.get_mut(key) else {
            return Ok(false);
        };
        if group.shadow_revision != revision {
            return Ok(false);
        }
        let Some(shadow) = group.shadow.as_mut() else {
            return Ok(false);
        };
        shadow.promoted_at = None;
        shadow.promoted_by = None;
        group.shadow_revision += 1;
        Ok(true)
    }

    async fn list_groups(&self, document_id: &DocumentId) -> StoreResult<Vec<CommentGroup>> {
        Ok(self
            .groups
            .iter()
            .filter(|g| g.key.document_id == *document_id)
            .map(|g| g.clone())
            .collect())
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn field_type(&self, target: &FieldTarget) -> StoreResult<Option<FieldType>> {
        Ok(self.fields.get(target).map(|slot| slot.field_type))
    }

    async fn read_field(&self, target: &FieldTarget) -> StoreResult<Option<serde_json::Value>> {
        Ok(self.fields.get(target).map(|slot| slot.value.clone()))
    }

    async fn write_field(
        &self,
        target: &FieldTarget,
        value: serde_json::Value,
    ) -> StoreResult<()> {
        if self.fail_field_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("field writes disabled".to_string()));
        }
        let Some(mut slot) = self.fields.get_mut(target) else {
            return Err(StoreError::Corrupt(format!(
                "no field {}.{} on {}",
                target.section, target.field_path, target.document_id
            )));
        };
        slot.value = value;
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for MemoryStore {
    async fn holds_role(&self, identity: &Identity, role: Role) -> StoreResult<bool> {
        Ok(self
            .directory
            .read()
            .get(identity)
            .is_some_and(|roles| roles.contains(&role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brd_types::UserType;
    use serde_json::json;
    use std::sync::Arc;

    fn key() -> CommentGroupKey {
        CommentGroupKey::document("d1", "scope", "summary")
    }

    #[tokio::test]
    async fn cas_rejects_stale_expected_state() {
        let store = MemoryStore::new();
        store.insert_document(Document::new("d1", LifecycleState::Draft, "ba-1"));
        let id = DocumentId::new("d1");

        assert!(store
            .cas_update_state(&id, LifecycleState::Draft, LifecycleState::InProgress)
            .await
            .unwrap());
        assert!(!store
            .cas_update_state(&id, LifecycleState::Draft, LifecycleState::InternalReview)
            .await
            .unwrap());
        let doc = store.get_document(&id).await.unwrap().unwrap();
        assert_eq!(doc.state, LifecycleState::InProgress);
    }

    #[tokio::test]
    async fn upsert_group_keeps_entries() {
        let store = MemoryStore::new();
        let author = Identity::new("ba-1");
        let (_, created) = store
            .upsert_group(&key(), GroupStatus::Pending, &author)
            .await
            .unwrap();
        assert!(created);

        store
            .append_entry(&key(), CommentEntry::new("ba-1", UserType::Ba, "hi"), 5)
            .await
            .unwrap();

        let (group, created) = store
            .upsert_group(&key(), GroupStatus::Resolved, &author)
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(group.status, GroupStatus::Resolved);
        assert_eq!(group.entries.len(), 1);
    }

    #[tokio::test]
    async fn append_checks_parent_and_limit() {
        let store = MemoryStore::new();
        store
            .upsert_group(&key(), GroupStatus::Pending, &Identity::new("ba-1"))
            .await
            .unwrap();

        let orphan = CommentEntry::new("ba-1", UserType::Ba, "reply").reply_to(EntryId::new());
        assert_eq!(
            store.append_entry(&key(), orphan, 5).await.unwrap(),
            AppendOutcome::ParentMissing
        );

        for i in 0..2 {
            let entry = CommentEntry::new("ba-1", UserType::Ba, format!("c{i}"));
            assert!(matches!(
                store.append_entry(&key(), entry, 2).await.unwrap(),
                AppendOutcome::Appended(_)
            ));
        }
        let third = CommentEntry::new("ba-1", UserType::Ba, "c2");
        assert_eq!(
            store.append_entry(&key(), third, 2).await.unwrap(),
            AppendOutcome::LimitReached { existing: 2 }
        );
        let other = CommentEntry::new("pm-1", UserType::Pm, "pm");
        assert!(matches!(
            store.append_entry(&key(), other, 2).await.unwrap(),
            AppendOutcome::Appended(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_never_pass_limit() {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_group(&key(), GroupStatus::Pending, &Identity::new("ba-1"))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let entry = CommentEntry::new("ba-1", UserType::Ba, format!("c{i}"));
                    store.append_entry(&key(), entry, 5).await.unwrap()
                })
            })
            .collect();

        let outcomes = futures::future::join_all(tasks).await;
        let appended = outcomes
            .into_iter()
            .filter(|o| matches!(o, Ok(AppendOutcome::Appended(_))))
            .count();

        assert_eq!(appended, 5);
        let group = store.get_group(&key()).await.unwrap().unwrap();
        assert_eq!(group.entries.len(), 5);
    }

    #[tokio::test]
    async fn claim_is_single_winner() {
        let store = MemoryStore::new();
        let ba = Identity::new("ba-1");
        store
            .upsert_group(&key(), GroupStatus::Pending, &ba)
            .await
            .unwrap();
        let revision = store
            .stage_shadow(&key(), ShadowValue::new(json!("x"), FieldType::Text, ba.clone()))
            .await
            .unwrap()
            .unwrap();

        let first = store.claim_shadow(&key(), revision, &ba).await.unwrap();
        let second = store.claim_shadow(&key(), revision, &ba).await.unwrap();

        let ClaimOutcome::Claimed { revision: claimed, .. } = first else {
            panic!("first claim should win");
        };
        assert_eq!(second, ClaimOutcome::Stale);

        assert!(store.release_shadow(&key(), claimed).await.unwrap());
        let group = store.get_group(&key()).await.unwrap().unwrap();
        assert!(group.has_pending_shadow());
    }

    #[tokio::test]
    async fn assignment_upsert_supersedes() {
        let store = MemoryStore::new();
        let doc = DocumentId::new("d1");
        let kind = CollaboratorKind::ProjectManager;

        assert_eq!(
            store.upsert_active(&doc, kind, &Identity::new("pm-1")).await.unwrap(),
            AssignmentChange::Created
        );
        assert_eq!(
            store.upsert_active(&doc, kind, &Identity::new("pm-1")).await.unwrap(),
            AssignmentChange::Refreshed
        );
        assert_eq!(
            store.upsert_active(&doc, kind, &Identity::new("pm-2")).await.unwrap(),
            AssignmentChange::Superseded {
                previous: Identity::new("pm-1")
            }
        );

        let history = store.history(&doc, kind).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|a| a.active).count(), 1);
        assert_eq!(
            store.active(&doc, kind).await.unwrap().unwrap().identity,
            Identity::new("pm-2")
        );
    }

    #[tokio::test]
    async fn field_write_fault_injection() {
        let store = MemoryStore::new();
        let target = key().target();
        store.define_field(target.clone(), FieldType::Text, json!("old"));

        store.fail_field_writes(true);
        assert!(store.write_field(&target, json!("new")).await.is_err());
        store.fail_field_writes(false);
        store.write_field(&target, json!("new")).await.unwrap();
        assert_eq!(store.read_field(&target).await.unwrap(), Some(json!("new")));
    }
}
