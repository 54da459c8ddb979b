//! Seeded in-memory engine for scenarios and simulation

use brd_core::{BrdResult, EngineConfig, Orchestrator, Ports};
use brd_store::MemoryStore;
use brd_types::{
    Caller, CollaboratorKind, CommentGroupKey, Document, DocumentId, FieldType, Identity,
    LifecycleState, Role,
};
use std::sync::Arc;

/// Creator of every seeded document
pub const CREATOR: &str = "ba-1";
/// Business analyst who did not create the documents
pub const OTHER_BA: &str = "ba-2";
/// Assigned reviewer
pub const REVIEWER: &str = "reviewer-1";
/// Assigned project manager
pub const PM: &str = "pm-1";
/// Project manager available for reassignment
pub const SPARE_PM: &str = "pm-2";
/// Oversight identity
pub const ADMIN: &str = "admin-1";

/// An orchestrator over a fresh [`MemoryStore`] with one seeded document
#[derive(Debug, Clone)]
pub struct SeededEngine {
    /// Backing store
    pub store: Arc<MemoryStore>,
    /// Orchestrator under test
    pub orchestrator: Orchestrator,
    /// The seeded document
    pub document_id: DocumentId,
}

impl SeededEngine {
    /// Seed `document_id` in `state` with the reviewer and PM assigned and a
    /// numeric `scope.budget` field
    ///
    /// # Errors
    /// Invalid configuration or assignment failures.
    pub async fn new(
        config: EngineConfig,
        document_id: impl Into<DocumentId>,
        state: LifecycleState,
    ) -> BrdResult<Self> {
        let document_id = document_id.into();
        let store = Arc::new(MemoryStore::new());
        for (identity, role) in [
            (CREATOR, Role::BusinessAnalyst),
            (OTHER_BA, Role::BusinessAnalyst),
            (REVIEWER, Role::Reviewer),
            (PM, Role::ProjectManager),
            (SPARE_PM, Role::ProjectManager),
            (ADMIN, Role::Admin),
        ] {
            store.grant_role(identity, role);
        }
        let orchestrator = Orchestrator::new(Ports::shared(store.clone()), config)?;
        let engine = Self {
            store,
            orchestrator,
            document_id,
        };
        engine.add_document(engine.document_id.clone(), state).await?;
        Ok(engine)
    }

    /// Seed another document with the same assignments and fields
    ///
    /// # Errors
    /// Assignment failures.
    pub async fn add_document(&self, document_id: DocumentId, state: LifecycleState) -> BrdResult<()> {
        self.store
            .insert_document(Document::new(document_id.clone(), state, CREATOR));
        self.store.define_field(
            Self::budget_key(&document_id).target(),
            FieldType::Number,
            serde_json::json!(1000),
        );
        self.orchestrator
            .assign(&document_id, CollaboratorKind::Reviewer, &Identity::new(REVIEWER))
            .await?;
        self.orchestrator
            .assign(&document_id, CollaboratorKind::ProjectManager, &Identity::new(PM))
            .await?;
        Ok(())
    }

    /// Group key of the numeric budget field
    #[must_use]
    pub fn budget_key(document_id: &DocumentId) -> CommentGroupKey {
        CommentGroupKey::document(document_id.clone(), "scope", "budget")
    }

    /// Caller acting as the seeded identity for `role`
    #[must_use]
    pub fn caller(role: Role) -> Caller {
        let identity = match role {
            Role::BusinessAnalyst => CREATOR,
            Role::Reviewer => REVIEWER,
            Role::ProjectManager => PM,
            Role::Admin => ADMIN,
        };
        Caller::new(identity, role)
    }
}
