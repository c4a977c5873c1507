//! Core domain types for the journal sync engine.
//!
//! This module contains the records mirrored from the issue tracker, their
//! identifiers, and the change events derived from them.

pub mod event;
pub mod ids;
pub mod issue;

// Re-export commonly used types at the module level
pub use event::{ChangeEvent, ChangeType, EventKind, EventMessage};
pub use ids::{CommentId, InvalidResourceRef, IssueNumber, RepoId, ResourceRef};
pub use issue::{Comment, Issue, IssueState};
