//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of different ID types (e.g., using a CommentId
//! where an IssueNumber is expected) and make the code more self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// An issue number within the tracked repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueNumber(pub u64);

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for IssueNumber {
    fn from(n: u64) -> Self {
        IssueNumber(n)
    }
}

/// A GitHub comment ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub u64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CommentId {
    fn from(n: u64) -> Self {
        CommentId(n)
    }
}

/// Maximum length of a namespace or name segment (DNS label).
const MAX_SEGMENT_LEN: usize = 63;

/// Error returned when a `namespace/name` reference is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid resource reference {input:?}: {reason}")]
pub struct InvalidResourceRef {
    pub input: String,
    pub reason: &'static str,
}

/// The cluster resource an issue is about, as a (namespace, name) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        ResourceRef {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parses a `namespace/name` string.
    ///
    /// Both segments must be DNS labels: 1-63 lowercase alphanumerics or `-`,
    /// not starting or ending with `-`.
    pub fn parse(s: &str) -> Result<Self, InvalidResourceRef> {
        let invalid = |reason| InvalidResourceRef {
            input: s.to_string(),
            reason,
        };

        let (namespace, name) = s.split_once('/').ok_or_else(|| invalid("missing '/'"))?;
        validate_segment(namespace).map_err(invalid)?;
        validate_segment(name).map_err(invalid)?;

        Ok(ResourceRef::new(namespace, name))
    }
}

fn validate_segment(segment: &str) -> Result<(), &'static str> {
    if segment.is_empty() {
        return Err("empty segment");
    }
    if segment.len() > MAX_SEGMENT_LEN {
        return Err("segment longer than 63 characters");
    }
    if !segment
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err("segment must be lowercase alphanumeric or '-'");
    }
    if segment.starts_with('-') || segment.ends_with('-') {
        return Err("segment must not start or end with '-'");
    }
    Ok(())
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// The repository that holds the journal issues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
