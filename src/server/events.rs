//! Server-Sent Events stream for one topic.
//!
//! Each connection holds its own subscription. Messages published before the
//! connection was opened are never replayed. A subscriber that falls more than
//! the channel capacity behind skips the messages it missed. Every stream ends
//! when the server's shutdown token is cancelled, so graceful shutdown never
//! waits on an idle subscriber.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::AppState;
use super::journals::ApiError;
use crate::fanout::{Subscription, Topic};

/// SSE event name every message is sent under.
pub const EVENT_NAME: &str = "events";

/// Subscribes to `issues` or `comments_{namespace}/{name}`.
pub async fn topic_events_handler(
    State(app_state): State<AppState>,
    Path(topic): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let topic: Topic = topic.parse()?;
    let subscription = app_state.hub().subscribe(&topic);
    debug!(topic = %topic, "Subscriber connected");

    let stream = message_stream(subscription, app_state.shutdown().clone());
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn message_stream(
    subscription: Subscription,
    shutdown: CancellationToken,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold(
        (subscription, shutdown),
        |(mut subscription, shutdown)| async move {
            loop {
                let received = tokio::select! {
                    biased;

                    _ = shutdown.cancelled() => None,
                    received = subscription.recv() => Some(received),
                };
                let Some(received) = received else {
                    debug!(topic = %subscription.topic(), "Closing stream for shutdown");
                    return None;
                };

                match received {
                    Ok(message) => {
                        match Event::default().event(EVENT_NAME).json_data(&*message) {
                            Ok(event) => return Some((Ok(event), (subscription, shutdown))),
                            Err(e) => warn!(
                                topic = %subscription.topic(),
                                error = %e,
                                "Failed to encode message"
                            ),
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            topic = %subscription.topic(),
                            skipped,
                            "Subscriber lagged, skipping missed messages"
                        );
                    }
                    Err(RecvError::Closed) => {
                        debug!(topic = %subscription.topic(), "Topic closed");
                        return None;
                    }
                }
            }
        },
    )
}
