//! The issue tracker seam.
//!
//! The sync engine only needs two read operations from the tracker. They are
//! expressed as a trait so the scheduler can be driven by a scripted tracker in
//! tests and by the octocrab client in production.

use std::future::Future;
use std::sync::Arc;

use crate::types::{Comment, Issue, IssueNumber};

mod error;
mod title;

pub use error::{ErrorKind, TRANSIENT_STATUS_CODES, TrackerError};
pub use title::parse_journal_title;

/// Read access to journal issues in the tracker.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct StaticTracker(Vec<Issue>);
///
/// impl IssueTracker for StaticTracker {
///     async fn list_open_issues(&self) -> Result<Vec<Issue>, TrackerError> {
///         Ok(self.0.clone())
///     }
///
///     async fn list_comments(&self, _: IssueNumber) -> Result<Vec<Comment>, TrackerError> {
///         Ok(Vec::new())
///     }
/// }
/// ```
pub trait IssueTracker {
    /// Lists every open journal issue.
    fn list_open_issues(&self) -> impl Future<Output = Result<Vec<Issue>, TrackerError>> + Send;

    /// Lists the comments of one issue, oldest first.
    fn list_comments(
        &self,
        issue: IssueNumber,
    ) -> impl Future<Output = Result<Vec<Comment>, TrackerError>> + Send;
}

impl<T: IssueTracker> IssueTracker for Arc<T> {
    fn list_open_issues(&self) -> impl Future<Output = Result<Vec<Issue>, TrackerError>> + Send {
        (**self).list_open_issues()
    }

    fn list_comments(
        &self,
        issue: IssueNumber,
    ) -> impl Future<Output = Result<Vec<Comment>, TrackerError>> + Send {
        (**self).list_comments(issue)
    }
}
