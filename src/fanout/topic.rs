//! Topic naming for published change events.
//!
//! - `issues` carries every issue-level change
//! - `comments_{namespace}/{name}` carries comment changes for one resource

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::types::{ChangeEvent, InvalidResourceRef, ResourceRef};

const ISSUES_TOPIC: &str = "issues";
const COMMENTS_PREFIX: &str = "comments_";

/// A named channel that subscribers attach to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// All issue changes.
    Issues,

    /// Comment changes for issues about one resource.
    Comments(ResourceRef),
}

impl Topic {
    /// Returns the topic an event is published to.
    pub fn for_event(event: &ChangeEvent) -> Topic {
        match event {
            ChangeEvent::IssueChanged { .. } => Topic::Issues,
            ChangeEvent::CommentChanged { owner, .. } => Topic::Comments(owner.clone()),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Issues => f.write_str(ISSUES_TOPIC),
            Topic::Comments(resource) => write!(f, "{}{}", COMMENTS_PREFIX, resource),
        }
    }
}

/// Error returned when a topic name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTopic {
    #[error("unknown topic {0:?}")]
    Unknown(String),

    #[error("invalid comments topic: {0}")]
    Resource(#[from] InvalidResourceRef),
}

impl FromStr for Topic {
    type Err = InvalidTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ISSUES_TOPIC {
            return Ok(Topic::Issues);
        }
        match s.strip_prefix(COMMENTS_PREFIX) {
            Some(reference) => Ok(Topic::Comments(ResourceRef::parse(reference)?)),
            None => Err(InvalidTopic::Unknown(s.to_string())),
        }
    }
}
