//! Journal records mirrored from the issue tracker.
//!
//! The sync engine identifies issues by number and comments by
//! (issue number, comment id). Everything else on these records is payload:
//! it is compared for change detection but never interpreted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CommentId, IssueNumber, ResourceRef};

/// Open/closed state of an issue as reported by the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn is_open(&self) -> bool {
        matches!(self, IssueState::Open)
    }
}

/// A journal issue concerning one cluster resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// The tracker-assigned issue number.
    pub number: IssueNumber,

    /// Whether the issue is open or closed.
    pub state: IssueState,

    /// The resource this issue is about, parsed from the title prefix.
    pub resource: ResourceRef,

    /// The title with the resource prefix stripped.
    pub title: String,

    /// Label names, in tracker order.
    pub labels: Vec<String>,

    /// Login of the issue author.
    pub author: String,

    /// Issue body (markdown), empty if none.
    pub body: String,

    /// Link to the issue in the tracker UI.
    pub html_url: String,

    /// Number of comments the tracker reports for the issue.
    pub comment_count: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }
}

/// A comment on a journal issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// The tracker-assigned comment ID.
    pub id: CommentId,

    /// The issue this comment belongs to.
    pub issue_number: IssueNumber,

    /// Login of the comment author.
    pub author: String,

    /// Comment body (markdown), empty if none.
    pub body: String,

    /// Link to the comment in the tracker UI.
    pub html_url: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
