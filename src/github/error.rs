//! Classification of octocrab failures.
//!
//! GitHub reports failures as HTTP statuses. The structured `GitHub` variant of
//! `octocrab::Error` carries the status directly; other variants (transport,
//! decoding) are inspected by message as a fallback. Classification itself is
//! owned by [`ErrorKind::from_status`]: only the gateway and origin-unreachable
//! statuses are transient.

use crate::tracker::{ErrorKind, TrackerError};

impl TrackerError {
    /// Categorizes an octocrab error.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = extract_status_code(&err);
        let message = match &err {
            octocrab::Error::GitHub { source, .. } => source.message.clone(),
            other => other.to_string(),
        };

        Self {
            kind: ErrorKind::from_status(status_code),
            status_code,
            message,
            source: Some(err),
        }
    }
}

/// Extracts the HTTP status code from an octocrab error, if present.
fn extract_status_code(err: &octocrab::Error) -> Option<u16> {
    match err {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        other => status_from_message(&other.to_string()),
    }
}

/// Finds a `status: NNN` marker in an error message.
///
/// Transport errors from hyper and tower include the upstream status this way
/// when a proxy in front of GitHub answers instead of GitHub itself.
fn status_from_message(message: &str) -> Option<u16> {
    let idx = message.find("status: ")?;
    let digits: String = message[idx + 8..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok().filter(|code| (100..600).contains(code))
}
