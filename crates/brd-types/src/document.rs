//! Document snapshots and assignment records

use crate::ids::{DocumentId, Identity};
use crate::lifecycle::LifecycleState;
use crate::role::CollaboratorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of an externally-owned document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document ID
    pub id: DocumentId,
    /// Current lifecycle state
    pub state: LifecycleState,
    /// Identity holding the creator role for this document
    pub creator: Identity,
}

impl Document {
    /// Create snapshot
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<DocumentId>, state: LifecycleState, creator: impl Into<Identity>) -> Self {
        Self {
            id: id.into(),
            state,
            creator: creator.into(),
        }
    }

    /// With a different state
    #[inline]
    #[must_use]
    pub fn with_state(mut self, state: LifecycleState) -> Self {
        self.state = state;
        self
    }
}

/// One assignment of an identity to a document as a collaborator kind
///
/// Superseded records are retained with `active == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Document
    pub document_id: DocumentId,
    /// Kind of collaborator
    pub kind: CollaboratorKind,
    /// Assigned identity
    pub identity: Identity,
    /// Whether this is the current assignment for (document, kind)
    pub active: bool,
    /// First assigned
    pub assigned_at: DateTime<Utc>,
    /// Last (re-)assigned to the same identity
    pub updated_at: DateTime<Utc>,
    /// When a different identity took over
    pub superseded_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Fresh active assignment
    #[must_use]
    pub fn new(document_id: DocumentId, kind: CollaboratorKind, identity: Identity) -> Self {
        let now = Utc::now();
        Self {
            document_id,
            kind,
            identity,
            active: true,
            assigned_at: now,
            updated_at: now,
            superseded_at: None,
        }
    }

    /// Mark as superseded
    pub fn supersede(&mut self, at: DateTime<Utc>) {
        self.active = false;
        self.superseded_at = Some(at);
    }
}
