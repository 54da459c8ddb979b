//! BRD Core
//!
//! The [`Orchestrator`] is the single entry point for document review use
//! cases. Every call carries an explicit [`Caller`] and runs the same
//! sequence:
//!
//! 1. resolve the document and its current lifecycle state
//! 2. [`AccessGate`](brd_policy::AccessGate) read check
//! 3. the use-case rule: [`StatusPolicy`](brd_policy::StatusPolicy) for
//!    transitions, [`CommentRule`](brd_policy::CommentRule) for field
//!    discussion
//! 4. delegate to the comment store, the shadow stager or the document store
//!
//! A failed check returns before anything is written. All failures are
//! reported as a [`BrdError`].

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod comments;
mod config;
mod error;
mod orchestrator;

pub use config::{ConfigError, EngineConfig};
pub use error::{BrdError, BrdResult, ErrorCategory, NotFoundKind, ValidationKind};
pub use orchestrator::{Orchestrator, Ports};

pub use brd_types::Caller;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
