//! Octocrab client wrapper scoped to the journal repository.
//!
//! `OctocrabClient` implements [`IssueTracker`]: it pages through open issues
//! and issue comments 100 at a time and maps octocrab's models onto the
//! crate's records. Pull requests (which GitHub lists as issues) and issues
//! whose title carries no `[namespace/name]` prefix are skipped.

use octocrab::Octocrab;
use octocrab::models::issues::{Comment as GhComment, Issue as GhIssue};
use tracing::{debug, instrument};

use crate::tracker::{IssueTracker, TrackerError, parse_journal_title};
use crate::types::{Comment, CommentId, Issue, IssueNumber, IssueState, RepoId};

const PAGE_SIZE: u8 = 100;

/// A GitHub API client scoped to a specific repository.
#[derive(Clone)]
pub struct OctocrabClient {
    client: Octocrab,
    repo: RepoId,
}

impl OctocrabClient {
    pub fn new(client: Octocrab, repo: RepoId) -> Self {
        Self { client, repo }
    }

    /// Creates a client from a GitHub token.
    ///
    /// `base_uri` points the client at a GitHub Enterprise API instead of
    /// api.github.com.
    pub fn from_token(
        token: impl Into<String>,
        repo: RepoId,
        base_uri: Option<&str>,
    ) -> Result<Self, octocrab::Error> {
        let mut builder = Octocrab::builder().personal_token(token.into());
        if let Some(uri) = base_uri {
            builder = builder.base_uri(uri)?;
        }
        Ok(Self::new(builder.build()?, repo))
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

impl IssueTracker for OctocrabClient {
    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn list_open_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        let mut page = 1u32;
        let mut issues = Vec::new();

        loop {
            let page_result = self
                .client
                .issues(&self.repo.owner, &self.repo.repo)
                .list()
                .state(octocrab::params::State::Open)
                .per_page(PAGE_SIZE)
                .page(page)
                .send()
                .await
                .map_err(TrackerError::from_octocrab)?;

            let items = page_result.items;
            let is_last_page = items.len() < usize::from(PAGE_SIZE);
            issues.extend(items.into_iter().filter_map(journal_issue));

            if is_last_page {
                break;
            }
            page += 1;
        }

        debug!(count = issues.len(), pages = page, "Listed open journal issues");
        Ok(issues)
    }

    #[instrument(skip(self), fields(repo = %self.repo))]
    async fn list_comments(&self, issue: IssueNumber) -> Result<Vec<Comment>, TrackerError> {
        let mut page = 1u32;
        let mut comments = Vec::new();

        loop {
            let page_result = self
                .client
                .issues(&self.repo.owner, &self.repo.repo)
                .list_comments(issue.0)
                .per_page(PAGE_SIZE)
                .page(page)
                .send()
                .await
                .map_err(TrackerError::from_octocrab)?;

            let items = page_result.items;
            let is_last_page = items.len() < usize::from(PAGE_SIZE);
            comments.extend(items.into_iter().map(|c| journal_comment(issue, c)));

            if is_last_page {
                break;
            }
            page += 1;
        }

        Ok(comments)
    }
}

/// Maps a GitHub issue onto a journal issue, or `None` if it is not one.
fn journal_issue(issue: GhIssue) -> Option<Issue> {
    if issue.pull_request.is_some() {
        return None;
    }

    let Some((resource, title)) = parse_journal_title(&issue.title) else {
        debug!(issue = issue.number, title = %issue.title, "Skipping issue without journal prefix");
        return None;
    };
    let title = title.to_string();

    let state = match issue.state {
        octocrab::models::IssueState::Open => IssueState::Open,
        _ => IssueState::Closed,
    };

    Some(Issue {
        number: IssueNumber(issue.number),
        state,
        resource,
        title,
        labels: issue.labels.into_iter().map(|label| label.name).collect(),
        author: issue.user.login,
        body: issue.body.unwrap_or_default(),
        html_url: issue.html_url.to_string(),
        comment_count: issue.comments,
        created_at: issue.created_at,
        updated_at: issue.updated_at,
    })
}

fn journal_comment(issue: IssueNumber, comment: GhComment) -> Comment {
    Comment {
        id: CommentId(comment.id.into_inner()),
        issue_number: issue,
        author: comment.user.login,
        body: comment.body.unwrap_or_default(),
        html_url: comment.html_url.to_string(),
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    }
}
