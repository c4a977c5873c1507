use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use journal_sync::cache::JournalCache;
use journal_sync::config::AppConfig;
use journal_sync::fanout::{NotificationFanout, TopicHub};
use journal_sync::github::OctocrabClient;
use journal_sync::server::{AppState, build_router};
use journal_sync::sync::{Poller, SyncConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "journal_sync=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;

    let cache = Arc::new(JournalCache::new());
    let hub = Arc::new(TopicHub::new(config.channel_capacity));
    let _fanout = NotificationFanout::attach(&cache, hub.clone());

    let tracker = match &config.tracker {
        Some(tracker) => {
            let client = OctocrabClient::from_token(
                tracker.token.clone(),
                tracker.repo.clone(),
                tracker.api_url.as_deref(),
            )
            .context("building GitHub client")?;
            tracing::info!(repo = %client.repo(), "Syncing journals from GitHub");
            Some(client)
        }
        None => None,
    };

    let shutdown = CancellationToken::new();
    let poller = Poller::new(tracker, cache.clone(), SyncConfig::new(config.sync_mode));
    let sync_enabled = poller.is_enabled();
    let poller_task = tokio::spawn(poller.run(shutdown.clone()));

    let app = build_router(AppState::new(cache, hub, sync_enabled, shutdown.clone()))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("listening on {}", config.bind_addr);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown requested");
            server_shutdown.cancel();
        })
        .await
        .context("serving HTTP")?;

    shutdown.cancel();
    let cycles = poller_task.await.context("joining poller task")?;
    tracing::info!(cycles, "Journal sync stopped");

    Ok(())
}
