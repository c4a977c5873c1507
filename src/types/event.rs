//! Change events emitted by the journal cache and the messages that carry
//! them to subscribers.

use serde::{Deserialize, Serialize};

use super::ids::ResourceRef;
use super::issue::{Comment, Issue};

/// Whether a record was seen for the first time or changed since last seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Added,
    Modified,
}

/// A change observed by the journal cache.
///
/// Emitted exactly once per addition or modification. Refreshes that return an
/// identical payload never produce an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// An issue was added to or modified in the cache.
    IssueChanged { change: ChangeType, issue: Issue },

    /// A comment was added or modified on a tracked issue.
    CommentChanged {
        change: ChangeType,
        comment: Comment,
        /// The resource owning the comment's issue.
        owner: ResourceRef,
    },
}

impl ChangeEvent {
    pub fn change(&self) -> ChangeType {
        match self {
            ChangeEvent::IssueChanged { change, .. } | ChangeEvent::CommentChanged { change, .. } => {
                *change
            }
        }
    }

    /// The message kind this event is published under.
    pub fn kind(&self) -> EventKind {
        match self {
            ChangeEvent::IssueChanged { .. } => EventKind::Issues,
            ChangeEvent::CommentChanged { .. } => EventKind::Comments,
        }
    }
}

/// The kind tag of a published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Issues,
    Comments,
}

/// A message published to a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    pub kind: EventKind,
    pub events: Vec<ChangeEvent>,
}

impl EventMessage {
    /// Wraps a single event in a message of the matching kind.
    pub fn single(event: ChangeEvent) -> Self {
        EventMessage {
            kind: event.kind(),
            events: vec![event],
        }
    }
}
