//! BRD Comments
//!
//! Field-anchored discussion for BRD documents.
//!
//! - [`CommentGroupStore`]: groups keyed by (entity, section, field), capped
//!   entries per user type, read receipts and projections
//! - [`ShadowValueStager`]: provisional field values and their single-writer
//!   promotion into the canonical record
//!
//! Neither type decides *who* may call it; that is the orchestrator's job.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod filter;
mod groups;
mod shadow;

pub use error::{CommentError, CommentResult};
pub use filter::{CommentFilter, GroupStats};
pub use groups::{CommentGroupStore, DEFAULT_COMMENT_LIMIT, DEFAULT_MAX_COMMENT_LENGTH};
pub use shadow::{Promotion, ShadowValueStager};
