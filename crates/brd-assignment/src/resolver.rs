//! Assignment resolver

use crate::bulk::{BulkReassignResponse, ItemFailure, ItemOutcome, ItemResult, ReassignItem};
use crate::AssignmentError;
use brd_store::{AssignmentChange, AssignmentStore, DocumentStore, IdentityDirectory};
use brd_types::{Assignment, CollaboratorKind, DocumentId, Identity};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;

/// Answers "is X assigned to D as kind K" and applies (re)assignments
#[derive(Clone)]
pub struct AssignmentResolver {
    assignments: Arc<dyn AssignmentStore>,
    documents: Arc<dyn DocumentStore>,
    directory: Arc<dyn IdentityDirectory>,
}

impl fmt::Debug for AssignmentResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssignmentResolver").finish_non_exhaustive()
    }
}

impl AssignmentResolver {
    /// Create resolver over the given ports
    #[must_use]
    pub fn new(
        assignments: Arc<dyn AssignmentStore>,
        documents: Arc<dyn DocumentStore>,
        directory: Arc<dyn IdentityDirectory>,
    ) -> Self {
        Self {
            assignments,
            documents,
            directory,
        }
    }

    /// Make `identity` the active `kind` collaborator on a document
    ///
    /// Re-assigning the same identity only refreshes its timestamp.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn assign(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
        identity: &Identity,
    ) -> Result<AssignmentChange, AssignmentError> {
        let change = self
            .assignments
            .upsert_active(document_id, kind, identity)
            .await?;
        match &change {
            AssignmentChange::Superseded { previous } => tracing::info!(
                document_id = %document_id,
                kind = %kind,
                previous = %previous,
                identity = %identity,
                "collaborator reassigned"
            ),
            AssignmentChange::Created => tracing::info!(
                document_id = %document_id,
                kind = %kind,
                identity = %identity,
                "collaborator assigned"
            ),
            AssignmentChange::Refreshed => tracing::debug!(
                document_id = %document_id,
                kind = %kind,
                identity = %identity,
                "assignment refreshed"
            ),
        }
        Ok(change)
    }

    /// Like [`Self::assign`], but the document must exist and `identity`
    /// must hold the role of `kind`
    ///
    /// # Errors
    /// `DocumentNotFound`, `RoleNotHeld`, or store failures.
    pub async fn assign_checked(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
        identity: &Identity,
    ) -> Result<AssignmentChange, AssignmentError> {
        if self.documents.get_document(document_id).await?.is_none() {
            return Err(AssignmentError::DocumentNotFound(document_id.clone()));
        }
        if !self.directory.holds_role(identity, kind.role()).await? {
            return Err(AssignmentError::RoleNotHeld {
                identity: identity.clone(),
                kind,
            });
        }
        self.assign(document_id, kind, identity).await
    }

    /// Whether `identity` is the active `kind` collaborator on a document
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn is_assigned(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
        identity: &Identity,
    ) -> Result<bool, AssignmentError> {
        Ok(self
            .assignments
            .active(document_id, kind)
            .await?
            .is_some_and(|a| a.identity == *identity))
    }

    /// Active assignment of a kind
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn current(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
    ) -> Result<Option<Assignment>, AssignmentError> {
        Ok(self.assignments.active(document_id, kind).await?)
    }

    /// Every assignment of a kind, oldest first
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn history(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
    ) -> Result<Vec<Assignment>, AssignmentError> {
        Ok(self.assignments.history(document_id, kind).await?)
    }

    /// Reassign `kind` on many documents
    ///
    /// Each item is validated and applied on its own; a failing item never
    /// aborts the others. At most `concurrency` items are in flight. The
    /// returned outcomes line up with `items`.
    pub async fn bulk_reassign(
        &self,
        kind: CollaboratorKind,
        items: Vec<ReassignItem>,
        concurrency: usize,
    ) -> BulkReassignResponse {
        let total = items.len();
        let outcomes: Vec<ItemOutcome> = stream::iter(items)
            .map(|item| self.reassign_one(kind, item))
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let response = BulkReassignResponse::from_outcomes(outcomes);
        tracing::info!(
            kind = %kind,
            total,
            failed = response.failed_count(),
            "bulk reassignment finished"
        );
        response
    }

    async fn reassign_one(&self, kind: CollaboratorKind, item: ReassignItem) -> ItemOutcome {
        let result = match self.assign_checked(&item.document_id, kind, &item.identity).await {
            Ok(_) => ItemResult::Success,
            Err(err) => {
                tracing::warn!(
                    document_id = %item.document_id,
                    identity = %item.identity,
                    reason = %err,
                    "reassignment item rejected"
                );
                ItemResult::Failed(ItemFailure::from(err))
            }
        };
        ItemOutcome {
            document_id: item.document_id,
            identity: item.identity,
            result,
        }
    }
}
