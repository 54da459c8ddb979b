//! Orchestrator: document resolution, gating and lifecycle transitions

use crate::config::{ConfigError, EngineConfig};
use crate::error::{BrdError, BrdResult, NotFoundKind, ValidationKind};
use brd_assignment::{AssignmentResolver, BulkReassignResponse, ReassignItem};
use brd_comments::{CommentGroupStore, ShadowValueStager};
use brd_policy::{AccessFacts, AccessGate, CommentRule, StatusPolicy};
use brd_store::{
    AssignmentChange, AssignmentStore, CommentStore, DocumentStore, EntityStore,
    IdentityDirectory,
};
use brd_types::{Assignment, Caller, CollaboratorKind, Document, DocumentId, Identity, LifecycleState};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The persistence ports the orchestrator runs against
#[derive(Clone)]
pub struct Ports {
    /// Documents and their lifecycle state
    pub documents: Arc<dyn DocumentStore>,
    /// Collaborator assignments
    pub assignments: Arc<dyn AssignmentStore>,
    /// Comment groups
    pub comments: Arc<dyn CommentStore>,
    /// Canonical field values
    pub entities: Arc<dyn EntityStore>,
    /// Role membership
    pub directory: Arc<dyn IdentityDirectory>,
}

impl Ports {
    /// All ports served by one store
    #[must_use]
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: DocumentStore + AssignmentStore + CommentStore + EntityStore + IdentityDirectory + 'static,
    {
        Self {
            documents: store.clone(),
            assignments: store.clone(),
            comments: store.clone(),
            entities: store.clone(),
            directory: store,
        }
    }
}

impl fmt::Debug for Ports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ports").finish_non_exhaustive()
    }
}

/// Entry point for every document review use case
///
/// Holds no mutable state of its own; all durable state is behind [`Ports`].
#[derive(Clone)]
pub struct Orchestrator {
    pub(crate) documents: Arc<dyn DocumentStore>,
    pub(crate) resolver: AssignmentResolver,
    pub(crate) gate: AccessGate,
    pub(crate) policy: StatusPolicy,
    pub(crate) rule: CommentRule,
    pub(crate) groups: CommentGroupStore,
    pub(crate) stager: ShadowValueStager,
    pub(crate) config: EngineConfig,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("groups", &self.groups)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Wire the orchestrator over `ports`
    ///
    /// # Errors
    /// [`ConfigError::Zero`] when `config` has a zero limit.
    pub fn new(ports: Ports, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let resolver = AssignmentResolver::new(
            ports.assignments,
            ports.documents.clone(),
            ports.directory,
        );
        let groups = CommentGroupStore::new(ports.comments.clone())
            .with_limit(config.comment_limit_per_user_type)
            .with_max_length(config.max_comment_length);
        Ok(Self {
            gate: AccessGate::new(resolver.clone()),
            stager: ShadowValueStager::new(ports.comments, ports.entities),
            documents: ports.documents,
            resolver,
            policy: StatusPolicy::new(),
            rule: CommentRule::new(),
            groups,
            config,
        })
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load a document the caller may read
    ///
    /// # Errors
    /// `NotFound` for an unknown document, `AccessDenied` from the gate.
    pub async fn document(&self, caller: &Caller, document_id: &DocumentId) -> BrdResult<Document> {
        let document = self.resolve(document_id).await?;
        if let Err(err) = self.gate.check_access(caller, &document).await {
            return Err(denied(caller, &document, err.into()));
        }
        Ok(document)
    }

    /// Pure transition decision, without touching any store
    ///
    /// # Errors
    /// `AccessDenied` with the policy's reason.
    pub fn check_transition(
        &self,
        caller: &Caller,
        current: LifecycleState,
        target: LifecycleState,
    ) -> BrdResult<()> {
        Ok(self.policy.check_transition(caller.role, current, target)?)
    }

    /// Move a document to `target`
    ///
    /// The write is a compare-and-swap on the state the decision was made
    /// against, so a decision on a stale snapshot is rejected.
    ///
    /// # Errors
    /// `NotFound`, `AccessDenied`, `Validation` when `target` is the current
    /// state, `Conflict` when the document moved concurrently.
    pub async fn transition(
        &self,
        caller: &Caller,
        document_id: &DocumentId,
        target: LifecycleState,
    ) -> BrdResult<Document> {
        let document = self.document(caller, document_id).await?;
        let current = document.state;

        if let Err(reason) = self.policy.check_transition(caller.role, current, target) {
            return Err(denied(caller, &document, BrdError::AccessDenied(reason)));
        }
        if target == current {
            return Err(BrdError::Validation(ValidationKind::SameState(current)));
        }

        if !self.documents.cas_update_state(document_id, current, target).await? {
            warn!(
                document_id = %document_id,
                identity = %caller.identity,
                expected = %current,
                target = %target,
                "transition lost to a concurrent change"
            );
            return Err(BrdError::Conflict(format!(
                "document {document_id} is no longer {current}"
            )));
        }

        info!(
            document_id = %document_id,
            identity = %caller.identity,
            role = %caller.role,
            from = %current,
            to = %target,
            "document transitioned"
        );
        Ok(document.with_state(target))
    }

    /// Whether `identity` is the active `kind` collaborator on a document
    ///
    /// # Errors
    /// Store failures.
    pub async fn is_assigned(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
        identity: &Identity,
    ) -> BrdResult<bool> {
        Ok(self.resolver.is_assigned(document_id, kind, identity).await?)
    }

    /// Make `identity` the active `kind` collaborator, superseding any other
    ///
    /// # Errors
    /// `NotFound` for an unknown document, `Validation` when `identity` does
    /// not hold the kind's role.
    pub async fn assign(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
        identity: &Identity,
    ) -> BrdResult<AssignmentChange> {
        Ok(self.resolver.assign_checked(document_id, kind, identity).await?)
    }

    /// Active assignment of a kind
    ///
    /// # Errors
    /// Store failures.
    pub async fn current_assignment(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
    ) -> BrdResult<Option<Assignment>> {
        Ok(self.resolver.current(document_id, kind).await?)
    }

    /// Every assignment of a kind, oldest first
    ///
    /// # Errors
    /// Store failures.
    pub async fn assignment_history(
        &self,
        document_id: &DocumentId,
        kind: CollaboratorKind,
    ) -> BrdResult<Vec<Assignment>> {
        Ok(self.resolver.history(document_id, kind).await?)
    }

    /// Reassign the configured collaborator kind on many documents
    ///
    /// Items fail individually; see [`BulkReassignResponse`].
    pub async fn bulk_reassign(&self, items: Vec<ReassignItem>) -> BulkReassignResponse {
        self.resolver
            .bulk_reassign(
                self.config.bulk_reassign_kind,
                items,
                self.config.bulk_reassign_concurrency,
            )
            .await
    }

    /// Resolve, gate, then apply the field discussion rule
    pub(crate) async fn authorize_comment(
        &self,
        caller: &Caller,
        document_id: &DocumentId,
    ) -> BrdResult<Document> {
        let document = self.resolve(document_id).await?;
        let facts = AccessFacts {
            creator: document.creator.clone(),
            assigned: self.gate.is_assigned(caller, &document).await?,
        };
        let decision = AccessGate::evaluate(caller.role, &caller.identity, document.state, &facts)
            .and_then(|()| {
                self.rule
                    .check(caller.role, &caller.identity, document.state, &facts)
            });
        match decision {
            Ok(()) => {
                debug!(document_id = %document_id, role = %caller.role, state = %document.state, "comment access granted");
                Ok(document)
            }
            Err(reason) => Err(denied(caller, &document, reason.into())),
        }
    }

    async fn resolve(&self, document_id: &DocumentId) -> BrdResult<Document> {
        self.documents
            .get_document(document_id)
            .await?
            .ok_or_else(|| BrdError::NotFound(NotFoundKind::Document(document_id.clone())))
    }
}

/// Log a denial and pass the error through
pub(crate) fn denied(caller: &Caller, document: &Document, err: BrdError) -> BrdError {
    if let Some(reason) = err.deny_reason() {
        warn!(
            document_id = %document.id,
            identity = %caller.identity,
            role = %caller.role,
            state = %document.state,
            reason = reason.code(),
            "access denied"
        );
    }
    err
}
