//! Read projections over comment groups

use brd_types::{CommentGroup, DocumentId, EntityKind, GroupStatus, SubEntityId};
use serde::{Deserialize, Serialize};

/// Selects groups of one document; every `None` field matches anything
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentFilter {
    /// Document whose groups are listed
    pub document_id: DocumentId,
    /// Restrict to one entity kind
    pub entity_kind: Option<EntityKind>,
    /// Restrict to one sub-entity
    pub sub_entity_id: Option<SubEntityId>,
    /// Restrict to one section
    pub section: Option<String>,
    /// Restrict to one field
    pub field_path: Option<String>,
    /// Restrict to one status
    pub status: Option<GroupStatus>,
}

impl CommentFilter {
    /// Match every group of `document_id`
    #[must_use]
    pub fn for_document(document_id: impl Into<DocumentId>) -> Self {
        Self {
            document_id: document_id.into(),
            entity_kind: None,
            sub_entity_id: None,
            section: None,
            field_path: None,
            status: None,
        }
    }

    /// Only groups of this entity kind
    #[must_use]
    pub fn with_entity_kind(mut self, kind: EntityKind) -> Self {
        self.entity_kind = Some(kind);
        self
    }

    /// Only groups of this sub-entity
    #[must_use]
    pub fn with_sub_entity(mut self, sub_entity_id: impl Into<SubEntityId>) -> Self {
        self.sub_entity_id = Some(sub_entity_id.into());
        self
    }

    /// Only groups in this section
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Only groups on this field
    #[must_use]
    pub fn with_field_path(mut self, field_path: impl Into<String>) -> Self {
        self.field_path = Some(field_path.into());
        self
    }

    /// Only groups with this status
    #[must_use]
    pub fn with_status(mut self, status: GroupStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether `group` passes the filter
    #[must_use]
    pub fn matches(&self, group: &CommentGroup) -> bool {
        let key = &group.key;
        key.document_id == self.document_id
            && self.entity_kind.map_or(true, |k| k == key.entity_kind)
            && self
                .sub_entity_id
                .as_ref()
                .map_or(true, |s| key.sub_entity_id.as_ref() == Some(s))
            && self.section.as_ref().map_or(true, |s| *s == key.section)
            && self.field_path.as_ref().map_or(true, |f| *f == key.field_path)
            && self.status.map_or(true, |s| s == group.status)
    }
}

/// Counts of a document's groups in one status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Document
    pub document_id: DocumentId,
    /// Status counted
    pub status: GroupStatus,
    /// Groups in that status
    pub group_count: usize,
    /// Entries across those groups
    pub entry_count: usize,
    /// Of which anchored to the document
    pub document_groups: usize,
    /// Of which anchored to a sub-entity
    pub sub_entity_groups: usize,
}

impl GroupStats {
    /// Tally `groups`, counting only those in `status`
    #[must_use]
    pub fn tally<'a>(
        document_id: DocumentId,
        status: GroupStatus,
        groups: impl IntoIterator<Item = &'a CommentGroup>,
    ) -> Self {
        let mut stats = Self {
            document_id,
            status,
            group_count: 0,
            entry_count: 0,
            document_groups: 0,
            sub_entity_groups: 0,
        };
        for group in groups.into_iter().filter(|g| g.status == status) {
            stats.group_count += 1;
            stats.entry_count += group.entries.len();
            match group.key.entity_kind {
                EntityKind::Document => stats.document_groups += 1,
                EntityKind::SubEntity => stats.sub_entity_groups += 1,
            }
        }
        stats
    }
}
