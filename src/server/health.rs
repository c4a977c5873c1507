//! Health check endpoint for liveness probes.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;

/// Liveness payload.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,

    /// False when no tracker is configured and the poller never runs.
    pub sync_enabled: bool,

    pub tracked_issues: usize,
}

/// Returns 200 OK whenever the server is accepting connections.
///
/// # Example
///
/// ```ignore
/// GET /health HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: application/json
///
/// {"status":"ok","sync_enabled":true,"tracked_issues":3}
/// ```
pub async fn health_handler(State(app_state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        sync_enabled: app_state.sync_enabled(),
        tracked_issues: app_state.cache().len(),
    })
}
