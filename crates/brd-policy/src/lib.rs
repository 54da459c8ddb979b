//! BRD Policy
//!
//! The single home of every role × lifecycle-state rule:
//!
//! - [`StatusPolicy`]: may this role move a document out of its current state?
//! - [`AccessGate`]: may this caller see the document at all?
//! - [`CommentRule`]: may this caller take part in field discussion?
//! - [`policy_table`]: the three decisions above for every (role, state) pair
//!
//! All three share the collaborator review windows from [`review_window`],
//! so the read, write and transition rules cannot drift apart.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod comment_rule;
mod gate;
mod reason;
mod status;
mod table;

pub use comment_rule::CommentRule;
pub use gate::{AccessError, AccessFacts, AccessGate};
pub use reason::DenyReason;
pub use status::{review_window, StatusPolicy};
pub use table::{policy_table, Decision, PolicyRow};
