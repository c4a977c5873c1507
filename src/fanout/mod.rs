//! Notification fanout: routes cache change events to subscriber topics.
//!
//! The fanout registers on both of the cache's event streams and republishes
//! every event, one event per message, to its topic:
//!
//! - `IssueChanged` → `issues` (kind `issues`)
//! - `CommentChanged` → `comments_{namespace}/{name}` of the owning resource
//!   (kind `comments`)
//!
//! It does no filtering, batching, or deduplication of its own; the cache only
//! emits real changes, and errors never reach a topic because only applied
//! changes are emitted.

use std::sync::Arc;

use tracing::trace;

use crate::cache::JournalCache;
use crate::types::{ChangeEvent, EventMessage};

mod hub;
mod topic;

pub use hub::{DEFAULT_CHANNEL_CAPACITY, Subscription, TopicHub};
pub use topic::{InvalidTopic, Topic};

/// The realtime delivery substrate.
///
/// `publish` is called synchronously from inside cache event dispatch, so
/// implementations must not block.
pub trait Publisher: Send + Sync {
    /// Delivers a message to every current subscriber of `topic`.
    fn publish(&self, topic: &Topic, message: EventMessage);
}

/// Republishes cache events to topics.
pub struct NotificationFanout<P> {
    publisher: Arc<P>,
}

impl<P> NotificationFanout<P>
where
    P: Publisher + 'static,
{
    pub fn new(publisher: Arc<P>) -> Self {
        NotificationFanout { publisher }
    }

    /// Creates a fanout and registers it on both of the cache's event streams.
    pub fn attach(cache: &JournalCache, publisher: Arc<P>) -> Arc<Self> {
        let fanout = Arc::new(Self::new(publisher));

        let on_issue = fanout.clone();
        cache.on_issue_changed(move |event| on_issue.route(event));
        let on_comment = fanout.clone();
        cache.on_comment_changed(move |event| on_comment.route(event));

        fanout
    }

    /// Publishes one event to the topic it belongs to.
    pub fn route(&self, event: &ChangeEvent) {
        let topic = Topic::for_event(event);
        trace!(topic = %topic, change = ?event.change(), "Routing change event");
        self.publisher
            .publish(&topic, EventMessage::single(event.clone()));
    }
}
