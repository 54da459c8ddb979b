//! Bulk reassignment request and response types

use brd_types::{CollaboratorKind, DocumentId, Identity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One requested reassignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignItem {
    /// Target document
    pub document_id: DocumentId,
    /// Identity that should take over
    pub identity: Identity,
}

impl ReassignItem {
    /// Create item
    #[inline]
    #[must_use]
    pub fn new(document_id: impl Into<DocumentId>, identity: impl Into<Identity>) -> Self {
        Self {
            document_id: document_id.into(),
            identity: identity.into(),
        }
    }
}

/// Why a single item failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ItemFailure {
    /// Document does not exist
    DocumentNotFound,
    /// New identity does not hold the role required for the kind
    RoleNotHeld {
        /// Kind being reassigned
        kind: CollaboratorKind,
    },
    /// Store failed for this item
    Store {
        /// Store error text
        message: String,
    },
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemFailure::DocumentNotFound => f.write_str("document not found"),
            ItemFailure::RoleNotHeld { kind } => write!(f, "not a {}", kind.short_name()),
            ItemFailure::Store { message } => write!(f, "store error: {message}"),
        }
    }
}

/// Result of one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "failure", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemResult {
    /// Applied
    Success,
    /// Not applied
    Failed(ItemFailure),
}

impl ItemResult {
    /// Applied?
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ItemResult::Success)
    }
}

impl fmt::Display for ItemResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemResult::Success => f.write_str("SUCCESS"),
            ItemResult::Failed(reason) => write!(f, "FAILED({reason})"),
        }
    }
}

/// Per-item report entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Document of the item
    pub document_id: DocumentId,
    /// Identity of the item
    pub identity: Identity,
    /// What happened
    pub result: ItemResult,
}

/// Overall status of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReassignStatus {
    /// Every item succeeded
    Success,
    /// At least one item failed
    Failure,
}

/// Batch report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReassignResponse {
    /// Overall status
    pub status: ReassignStatus,
    /// One outcome per requested item, in request order
    pub items: Vec<ItemOutcome>,
}

impl BulkReassignResponse {
    /// Derive the overall status from item outcomes
    #[must_use]
    pub fn from_outcomes(items: Vec<ItemOutcome>) -> Self {
        let status = if items.iter().all(|i| i.result.is_success()) {
            ReassignStatus::Success
        } else {
            ReassignStatus::Failure
        };
        Self { status, items }
    }

    /// Number of failed items
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.items.iter().filter(|i| !i.result.is_success()).count()
    }
}
