//! Read-only views of the journal cache.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::AppState;
use crate::fanout::InvalidTopic;
use crate::types::{Comment, Issue, IssueNumber};

/// Errors returned by the journal endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The issue is not in the cache (closed, unknown, or not yet synced).
    #[error("journal issue not tracked: {0}")]
    IssueNotTracked(IssueNumber),

    #[error("invalid topic: {0}")]
    InvalidTopic(#[from] InvalidTopic),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::IssueNotTracked(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidTopic(_) => StatusCode::BAD_REQUEST,
        };

        (status, self.to_string()).into_response()
    }
}

/// Lists every tracked journal issue, ordered by number.
pub async fn list_issues_handler(State(app_state): State<AppState>) -> Json<Vec<Issue>> {
    Json(app_state.cache().issues())
}

/// Lists the cached comments of one tracked issue.
///
/// - 200 OK with a JSON array (possibly empty)
/// - 404 Not Found if the issue is not tracked
pub async fn list_comments_handler(
    State(app_state): State<AppState>,
    Path(number): Path<u64>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let number = IssueNumber(number);
    app_state
        .cache()
        .comments(number)
        .map(Json)
        .ok_or(ApiError::IssueNotTracked(number))
}
