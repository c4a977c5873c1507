//! In-process topic hub backed by broadcast channels.
//!
//! Each topic gets a `tokio::sync::broadcast` channel on first subscription.
//! Publishing to a topic nobody listens to is a no-op: there is no replay
//! buffer, so subscribers only ever see messages published after they joined.
//! A channel is dropped again as soon as its last [`Subscription`] is dropped,
//! so the number of channels never exceeds the number of live subscribers.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, trace};

use crate::types::EventMessage;

use super::Publisher;
use super::topic::Topic;

/// Default per-topic buffer before slow subscribers start lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

type Channels = Arc<RwLock<HashMap<Topic, broadcast::Sender<Arc<EventMessage>>>>>;

/// Routes published messages to the current subscribers of each topic.
#[derive(Debug)]
pub struct TopicHub {
    capacity: usize,
    channels: Channels,
}

impl Default for TopicHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl TopicHub {
    /// Creates a hub whose topics buffer up to `capacity` messages per subscriber.
    pub fn new(capacity: usize) -> Self {
        TopicHub {
            capacity: capacity.max(1),
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribes to a topic, creating its channel if needed.
    ///
    /// The channel is removed when the last subscription to it is dropped.
    pub fn subscribe(&self, topic: &Topic) -> Subscription {
        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let sender = channels.entry(topic.clone()).or_insert_with(|| {
            debug!(topic = %topic, "Creating topic channel");
            broadcast::channel(self.capacity).0
        });

        Subscription {
            topic: topic.clone(),
            receiver: Some(sender.subscribe()),
            channels: self.channels.clone(),
        }
    }

    /// Returns the number of live subscribers of a topic.
    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Returns the number of topics with an open channel.
    pub fn topic_count(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Sends a message to every current subscriber, returning how many received it.
    fn send(&self, topic: &Topic, message: EventMessage) -> usize {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        channels
            .get(topic)
            .and_then(|sender| sender.send(Arc::new(message)).ok())
            .unwrap_or(0)
    }
}

impl Publisher for TopicHub {
    fn publish(&self, topic: &Topic, message: EventMessage) {
        let delivered = self.send(topic, message);
        trace!(topic = %topic, delivered, "Published message");
    }
}

/// One subscriber's handle on a topic.
#[derive(Debug)]
pub struct Subscription {
    topic: Topic,
    /// `None` only while dropping.
    receiver: Option<broadcast::Receiver<Arc<EventMessage>>>,
    channels: Channels,
}

impl Subscription {
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Waits for the next message published to the topic.
    pub async fn recv(&mut self) -> Result<Arc<EventMessage>, RecvError> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => Err(RecvError::Closed),
        }
    }

    /// Returns the next message if one is already buffered.
    pub fn try_recv(&mut self) -> Result<Arc<EventMessage>, TryRecvError> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.try_recv(),
            None => Err(TryRecvError::Closed),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        drop(self.receiver.take());

        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if channels
            .get(&self.topic)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            debug!(topic = %self.topic, "Dropping topic channel without subscribers");
            channels.remove(&self.topic);
        }
    }
}
