//! Engine configuration

use brd_comments::{DEFAULT_COMMENT_LIMIT, DEFAULT_MAX_COMMENT_LENGTH};
use brd_types::CollaboratorKind;
use serde::{Deserialize, Serialize};

/// Invalid configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML did not parse
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A limit that must be positive is zero
    #[error("config field `{0}` must be greater than zero")]
    Zero(&'static str),
}

/// Engine tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Entries one user type may add to one comment group
    pub comment_limit_per_user_type: usize,
    /// Bulk reassignment items in flight at once
    pub bulk_reassign_concurrency: usize,
    /// Collaborator kind bulk reassignment targets
    pub bulk_reassign_kind: CollaboratorKind,
    /// Longest comment text, in characters
    pub max_comment_length: usize,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With per-user-type comment cap
    #[inline]
    #[must_use]
    pub fn with_comment_limit(mut self, limit: usize) -> Self {
        self.comment_limit_per_user_type = limit;
        self
    }

    /// With bulk reassignment concurrency
    #[inline]
    #[must_use]
    pub fn with_bulk_concurrency(mut self, concurrency: usize) -> Self {
        self.bulk_reassign_concurrency = concurrency;
        self
    }

    /// With bulk reassignment kind
    #[inline]
    #[must_use]
    pub fn with_bulk_kind(mut self, kind: CollaboratorKind) -> Self {
        self.bulk_reassign_kind = kind;
        self
    }

    /// With maximum comment length
    #[inline]
    #[must_use]
    pub fn with_max_comment_length(mut self, length: usize) -> Self {
        self.max_comment_length = length;
        self
    }

    /// Parse from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// Parse failures and [`Self::validate`] failures.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject zero limits
    ///
    /// # Errors
    /// [`ConfigError::Zero`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.comment_limit_per_user_type == 0 {
            return Err(ConfigError::Zero("comment_limit_per_user_type"));
        }
        if self.bulk_reassign_concurrency == 0 {
            return Err(ConfigError::Zero("bulk_reassign_concurrency"));
        }
        if self.max_comment_length == 0 {
            return Err(ConfigError::Zero("max_comment_length"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            comment_limit_per_user_type: DEFAULT_COMMENT_LIMIT,
            bulk_reassign_concurrency: 8,
            bulk_reassign_kind: CollaboratorKind::ProjectManager,
            max_comment_length: DEFAULT_MAX_COMMENT_LENGTH,
        }
    }
}
