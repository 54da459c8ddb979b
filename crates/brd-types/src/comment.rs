//! Comment groups, entries and staged shadow values

use crate::ids::{DocumentId, EntryId, Identity, SubEntityId};
use crate::role::UserType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Which kind of entity a comment group is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    /// The document itself
    Document,
    /// A sub-entity ("site") of the document
    SubEntity,
}

/// Discussion status of a group; set by callers, never derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum GroupStatus {
    /// Open for discussion
    #[default]
    Pending,
    /// Closed
    Resolved,
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupStatus::Pending => "Pending",
            GroupStatus::Resolved => "Resolved",
        })
    }
}

/// Malformed comment group key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// Sub-entity groups need a sub-entity ID
    #[error("sub-entity group is missing its sub-entity id")]
    MissingSubEntity,
    /// Document groups must not name a sub-entity
    #[error("document group must not carry a sub-entity id")]
    UnexpectedSubEntity,
    /// Section name is blank
    #[error("section name is empty")]
    EmptySection,
    /// Field path is blank
    #[error("field path is empty")]
    EmptyFieldPath,
}

/// Unique key of a comment group
///
/// Creation is an upsert on this key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommentGroupKey {
    /// Anchoring entity kind
    pub entity_kind: EntityKind,
    /// Owning document
    pub document_id: DocumentId,
    /// Sub-entity, for [`EntityKind::SubEntity`] groups
    pub sub_entity_id: Option<SubEntityId>,
    /// Section of the form the field lives in
    pub section: String,
    /// Dotted path of the field within the section
    pub field_path: String,
}

impl CommentGroupKey {
    /// Key for a field of the document itself
    #[must_use]
    pub fn document(
        document_id: impl Into<DocumentId>,
        section: impl Into<String>,
        field_path: impl Into<String>,
    ) -> Self {
        Self {
            entity_kind: EntityKind::Document,
            document_id: document_id.into(),
            sub_entity_id: None,
            section: section.into(),
            field_path: field_path.into(),
        }
    }

    /// Key for a field of a sub-entity
    #[must_use]
    pub fn sub_entity(
        document_id: impl Into<DocumentId>,
        sub_entity_id: impl Into<SubEntityId>,
        section: impl Into<String>,
        field_path: impl Into<String>,
    ) -> Self {
        Self {
            entity_kind: EntityKind::SubEntity,
            document_id: document_id.into(),
            sub_entity_id: Some(sub_entity_id.into()),
            section: section.into(),
            field_path: field_path.into(),
        }
    }

    /// Check structural well-formedness
    ///
    /// # Errors
    /// Returns [`KeyError`] describing the first problem found.
    pub fn validate(&self) -> Result<(), KeyError> {
        match (self.entity_kind, &self.sub_entity_id) {
            (EntityKind::SubEntity, None) => return Err(KeyError::MissingSubEntity),
            (EntityKind::Document, Some(_)) => return Err(KeyError::UnexpectedSubEntity),
            _ => {}
        }
        if self.section.trim().is_empty() {
            return Err(KeyError::EmptySection);
        }
        if self.field_path.trim().is_empty() {
            return Err(KeyError::EmptyFieldPath);
        }
        Ok(())
    }

    /// Field this group discusses
    #[must_use]
    pub fn target(&self) -> FieldTarget {
        FieldTarget {
            entity_kind: self.entity_kind,
            document_id: self.document_id.clone(),
            sub_entity_id: self.sub_entity_id.clone(),
            section: self.section.clone(),
            field_path: self.field_path.clone(),
        }
    }
}

impl fmt::Display for CommentGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_entity_id {
            Some(sub) => write!(
                f,
                "{}/{}#{}.{}",
                self.document_id, sub, self.section, self.field_path
            ),
            None => write!(f, "{}#{}.{}", self.document_id, self.section, self.field_path),
        }
    }
}

/// Address of a canonical field on a document or sub-entity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldTarget {
    /// Entity kind
    pub entity_kind: EntityKind,
    /// Document
    pub document_id: DocumentId,
    /// Sub-entity, if any
    pub sub_entity_id: Option<SubEntityId>,
    /// Section
    pub section: String,
    /// Field path
    pub field_path: String,
}

/// Declared type of a field (and of a staged value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text
    Text,
    /// Integer or decimal
    Number,
    /// Yes/no
    Boolean,
    /// Calendar date, `YYYY-MM-DD`
    Date,
    /// JSON array
    List,
    /// JSON object
    Object,
}

impl FieldType {
    /// Whether a JSON value is a valid instance of this type
    ///
    /// `null` is admitted by every type and clears the field.
    #[must_use]
    pub fn admits(self, value: &serde_json::Value) -> bool {
        use serde_json::Value;
        match (self, value) {
            (_, Value::Null) => true,
            (FieldType::Text, Value::String(_)) => true,
            (FieldType::Number, Value::Number(_)) => true,
            (FieldType::Boolean, Value::Bool(_)) => true,
            (FieldType::Date, Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
            (FieldType::List, Value::Array(_)) => true,
            (FieldType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::List => "list",
            FieldType::Object => "object",
        })
    }
}

/// Provisional field value staged inside a comment group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowValue {
    /// Staged value
    pub value: serde_json::Value,
    /// Declared type of the staged value
    pub type_tag: FieldType,
    /// Who staged it
    pub staged_by: Identity,
    /// When it was staged
    pub staged_at: DateTime<Utc>,
    /// Set once promoted into the canonical record
    pub promoted_at: Option<DateTime<Utc>>,
    /// Who promoted it
    pub promoted_by: Option<Identity>,
}

impl ShadowValue {
    /// New, unpromoted shadow value
    #[must_use]
    pub fn new(value: serde_json::Value, type_tag: FieldType, staged_by: Identity) -> Self {
        Self {
            value,
            type_tag,
            staged_by,
            staged_at: Utc::now(),
            promoted_at: None,
            promoted_by: None,
        }
    }

    /// Still waiting for promotion
    #[inline]
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.promoted_at.is_none()
    }
}

/// One comment in a group
///
/// Replies reference an earlier entry of the same group by ID; the list
/// itself stays flat and append-ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentEntry {
    /// Entry ID
    pub id: EntryId,
    /// Author identity
    pub author: Identity,
    /// Quota category of the author
    pub user_type: UserType,
    /// Comment text
    pub text: String,
    /// Entry this one replies to
    pub parent: Option<EntryId>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Identities that have read this entry
    pub read_by: BTreeSet<Identity>,
}

impl CommentEntry {
    /// New top-level entry
    #[must_use]
    pub fn new(author: impl Into<Identity>, user_type: UserType, text: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            author: author.into(),
            user_type,
            text: text.into(),
            parent: None,
            created_at: Utc::now(),
            read_by: BTreeSet::new(),
        }
    }

    /// As a reply to an existing entry
    #[inline]
    #[must_use]
    pub fn reply_to(mut self, parent: EntryId) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Discussion anchored to one field of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentGroup {
    /// Unique key
    pub key: CommentGroupKey,
    /// Caller-controlled status
    pub status: GroupStatus,
    /// Staged value, if any
    pub shadow: Option<ShadowValue>,
    /// Bumped whenever the shadow value changes; guards promotion
    pub shadow_revision: u64,
    /// Who opened the group
    pub created_by: Identity,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last metadata change
    pub updated_at: DateTime<Utc>,
    /// Entries in append order
    pub entries: Vec<CommentEntry>,
}

impl CommentGroup {
    /// Fresh group with no entries
    #[must_use]
    pub fn new(key: CommentGroupKey, status: GroupStatus, created_by: Identity) -> Self {
        let now = Utc::now();
        Self {
            key,
            status,
            shadow: None,
            shadow_revision: 0,
            created_by,
            created_at: now,
            updated_at: now,
            entries: Vec::new(),
        }
    }

    /// Number of entries authored under a quota category
    #[must_use]
    pub fn count_for(&self, user_type: UserType) -> usize {
        self.entries
            .iter()
            .filter(|e| e.user_type == user_type)
            .count()
    }

    /// Entry by ID
    #[must_use]
    pub fn entry(&self, id: EntryId) -> Option<&CommentEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Whether the group holds a shadow value awaiting promotion
    #[inline]
    #[must_use]
    pub fn has_pending_shadow(&self) -> bool {
        self.shadow.as_ref().is_some_and(ShadowValue::is_pending)
    }
}
