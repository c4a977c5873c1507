//! HTTP surface of the journal sync service.
//!
//! This module implements the HTTP server that:
//! - Exposes the journal cache as read-only JSON
//! - Streams topic messages to subscribers over Server-Sent Events
//! - Provides health checks for liveness probes
//!
//! # Endpoints
//!
//! - `GET /health` - Returns 200 if the server is running
//! - `GET /api/v1/journals/issues` - Tracked issues as JSON
//! - `GET /api/v1/journals/issues/{number}/comments` - Cached comments of one issue
//! - `GET /api/v1/journals/topics/{*topic}` - SSE stream for `issues` or
//!   `comments_{namespace}/{name}`

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cache::JournalCache;
use crate::fanout::TopicHub;

pub mod events;
pub mod health;
pub mod journals;

pub use events::topic_events_handler;
pub use health::health_handler;
pub use journals::{ApiError, list_comments_handler, list_issues_handler};

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cache: Arc<JournalCache>,
    hub: Arc<TopicHub>,
    sync_enabled: bool,

    /// Cancelled on process shutdown; ends every open event stream.
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        cache: Arc<JournalCache>,
        hub: Arc<TopicHub>,
        sync_enabled: bool,
        shutdown: CancellationToken,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                cache,
                hub,
                sync_enabled,
                shutdown,
            }),
        }
    }

    pub fn cache(&self) -> &JournalCache {
        &self.inner.cache
    }

    pub fn hub(&self) -> &TopicHub {
        &self.inner.hub
    }

    pub fn sync_enabled(&self) -> bool {
        self.inner.sync_enabled
    }

    pub fn shutdown(&self) -> &CancellationToken {
        &self.inner.shutdown
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::get;

    axum::Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/journals/issues", get(list_issues_handler))
        .route(
            "/api/v1/journals/issues/{number}/comments",
            get(list_comments_handler),
        )
        .route("/api/v1/journals/topics/{*topic}", get(topic_events_handler))
        .with_state(app_state)
}
