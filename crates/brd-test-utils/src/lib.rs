//! Testing utilities for BRD workspace
//!
//! Shared fixtures: a seeded in-memory store and an orchestrator over it.

#![allow(missing_docs)]

use brd_core::{EngineConfig, Orchestrator, Ports};
use brd_store::MemoryStore;
use brd_types::{
    Caller, CollaboratorKind, CommentGroupKey, Document, DocumentId, FieldType, Identity,
    LifecycleState, Role,
};
use serde_json::json;
use std::sync::Arc;

pub const DOC_ID: &str = "brd-1";
pub const CREATOR: &str = "ba-alice";
pub const OTHER_BA: &str = "ba-bob";
pub const REVIEWER: &str = "rev-carol";
pub const OTHER_REVIEWER: &str = "rev-dave";
pub const PM: &str = "pm-erin";
pub const OTHER_PM: &str = "pm-frank";
pub const ADMIN: &str = "admin-grace";
pub const SITE_ID: &str = "site-7";

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub orchestrator: Orchestrator,
}

impl Fixture {
    pub fn document_id(&self) -> DocumentId {
        DocumentId::new(DOC_ID)
    }

    /// Force the document into `state`, bypassing policy
    pub fn set_state(&self, state: LifecycleState) {
        self.store.insert_document(Document::new(DOC_ID, state, CREATOR));
    }

    pub fn state(&self) -> LifecycleState {
        self.store.document(&self.document_id()).unwrap().state
    }
}

pub fn creator() -> Caller {
    Caller::new(CREATOR, Role::BusinessAnalyst)
}

pub fn other_ba() -> Caller {
    Caller::new(OTHER_BA, Role::BusinessAnalyst)
}

pub fn reviewer() -> Caller {
    Caller::new(REVIEWER, Role::Reviewer)
}

pub fn other_reviewer() -> Caller {
    Caller::new(OTHER_REVIEWER, Role::Reviewer)
}

pub fn pm() -> Caller {
    Caller::new(PM, Role::ProjectManager)
}

pub fn other_pm() -> Caller {
    Caller::new(OTHER_PM, Role::ProjectManager)
}

pub fn admin() -> Caller {
    Caller::new(ADMIN, Role::Admin)
}

/// Document-level field with a declared number type
pub fn budget_key() -> CommentGroupKey {
    CommentGroupKey::document(DOC_ID, "scope", "budget")
}

/// Document-level text field
pub fn summary_key() -> CommentGroupKey {
    CommentGroupKey::document(DOC_ID, "scope", "summary")
}

/// Sub-entity date field
pub fn site_date_key() -> CommentGroupKey {
    CommentGroupKey::sub_entity(DOC_ID, SITE_ID, "schedule", "go_live")
}

pub fn seeded_store(state: LifecycleState) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.insert_document(Document::new(DOC_ID, state, CREATOR));
    for (identity, role) in [
        (CREATOR, Role::BusinessAnalyst),
        (OTHER_BA, Role::BusinessAnalyst),
        (REVIEWER, Role::Reviewer),
        (OTHER_REVIEWER, Role::Reviewer),
        (PM, Role::ProjectManager),
        (OTHER_PM, Role::ProjectManager),
        (ADMIN, Role::Admin),
    ] {
        store.grant_role(identity, role);
    }
    store.define_field(budget_key().target(), FieldType::Number, json!(1000));
    store.define_field(summary_key().target(), FieldType::Text, json!("initial"));
    store.define_field(site_date_key().target(), FieldType::Date, json!("2026-01-01"));
    store
}

pub async fn setup_with_config(state: LifecycleState, config: EngineConfig) -> Fixture {
    let store = seeded_store(state);
    let orchestrator = Orchestrator::new(Ports::shared(store.clone()), config).unwrap();
    let document_id = DocumentId::new(DOC_ID);
    orchestrator
        .assign(&document_id, CollaboratorKind::Reviewer, &Identity::new(REVIEWER))
        .await
        .unwrap();
    orchestrator
        .assign(&document_id, CollaboratorKind::ProjectManager, &Identity::new(PM))
        .await
        .unwrap();
    Fixture { store, orchestrator }
}

/// Seeded document in `state` with reviewer and PM assigned
pub async fn setup(state: LifecycleState) -> Fixture {
    setup_with_config(state, EngineConfig::default()).await
}
