//! Shared test utilities: record builders and a scripted tracker.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::tracker::{IssueTracker, TrackerError};
use crate::types::{Comment, CommentId, Issue, IssueNumber, IssueState, ResourceRef};

pub fn fixed_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn make_issue(number: u64, namespace: &str, name: &str) -> Issue {
    Issue {
        number: IssueNumber(number),
        state: IssueState::Open,
        resource: ResourceRef::new(namespace, name),
        title: format!("Journal entry {number}"),
        labels: vec!["journal".to_string()],
        author: "operator".to_string(),
        body: String::new(),
        html_url: format!("https://github.com/gardener/journals/issues/{number}"),
        comment_count: 0,
        created_at: fixed_time(),
        updated_at: fixed_time(),
    }
}

pub fn make_comment(issue: u64, id: u64, body: &str) -> Comment {
    Comment {
        id: CommentId(id),
        issue_number: IssueNumber(issue),
        author: "operator".to_string(),
        body: body.to_string(),
        html_url: format!("https://github.com/gardener/journals/issues/{issue}#issuecomment-{id}"),
        created_at: fixed_time(),
        updated_at: None,
    }
}

/// A tracker that replays scripted responses and records every call.
///
/// Issue-list responses are consumed in order; once the script is exhausted the
/// last configured snapshot is returned again. Comment responses are keyed by
/// issue and default to an empty list.
#[derive(Default)]
pub struct MockTracker {
    issue_responses: Mutex<VecDeque<Result<Vec<Issue>, TrackerError>>>,
    steady_issues: Mutex<Vec<Issue>>,
    comment_responses: Mutex<HashMap<IssueNumber, VecDeque<Result<Vec<Comment>, TrackerError>>>>,
    calls: Mutex<Vec<TrackerCall>>,
}

/// A call made against the mock tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    ListOpenIssues,
    ListComments(IssueNumber),
}

impl MockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the snapshot returned once scripted responses run out.
    pub fn with_issues(self, issues: Vec<Issue>) -> Self {
        *self.steady_issues.lock().unwrap() = issues;
        self
    }

    /// Queues one response for the next `list_open_issues` call.
    pub fn push_issue_response(&self, response: Result<Vec<Issue>, TrackerError>) {
        self.issue_responses.lock().unwrap().push_back(response);
    }

    /// Queues one response for the next `list_comments` call for `issue`.
    pub fn push_comment_response(
        &self,
        issue: u64,
        response: Result<Vec<Comment>, TrackerError>,
    ) {
        self.comment_responses
            .lock()
            .unwrap()
            .entry(IssueNumber(issue))
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<TrackerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn issue_list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| **c == TrackerCall::ListOpenIssues)
            .count()
    }
}

impl IssueTracker for MockTracker {
    async fn list_open_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        self.calls.lock().unwrap().push(TrackerCall::ListOpenIssues);
        let scripted = self.issue_responses.lock().unwrap().pop_front();
        match scripted {
            Some(response) => response,
            None => Ok(self.steady_issues.lock().unwrap().clone()),
        }
    }

    async fn list_comments(&self, issue: IssueNumber) -> Result<Vec<Comment>, TrackerError> {
        self.calls.lock().unwrap().push(TrackerCall::ListComments(issue));
        let scripted = self
            .comment_responses
            .lock()
            .unwrap()
            .get_mut(&issue)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Ok(Vec::new()))
    }
}
