//! BRD Store
//!
//! Ports to the external collaborators the review engine sits on:
//!
//! - [`DocumentStore`]: document snapshots and compare-and-swap state updates
//! - [`AssignmentStore`]: single-active assignment records per (document, kind)
//! - [`CommentStore`]: comment groups with atomic, quota-checked appends
//! - [`EntityStore`]: canonical field values that shadow values promote into
//! - [`IdentityDirectory`]: which roles an identity holds
//!
//! Every mutating method is a single atomic step against the store. The
//! engine never reads a value, edits it and writes it back.
//!
//! [`MemoryStore`] implements all five ports in process and is what tests and
//! the simulator run against.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod memory;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use traits::{
    AppendOutcome, AssignmentChange, AssignmentStore, ClaimOutcome, CommentStore,
    DocumentStore, EntityStore, IdentityDirectory, ReadOutcome,
};
