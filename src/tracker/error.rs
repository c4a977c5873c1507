//! Issue tracker error types.
//!
//! This module defines error types that distinguish between transient and fatal
//! tracker failures. The distinction drives the retry policy:
//!
//! - **Transient** errors are upstream overload or unavailability and are retried
//!   indefinitely (HTTP 500, 502, 503, 504 and the Cloudflare 521, 522, 524)
//! - **Fatal** errors are everything else: any 4xx, other statuses, network errors
//!   without a status, malformed responses. They abort the current cycle.

use std::fmt;
use thiserror::Error;

/// Status codes that indicate a transient upstream failure.
pub const TRANSIENT_STATUS_CODES: [u16; 7] = [500, 502, 503, 504, 521, 522, 524];

/// The kind of tracker error, categorized for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Upstream overload or unavailability. Safe to retry with backoff.
    Transient,

    /// Any other failure. Retrying will not help.
    Fatal,
}

impl ErrorKind {
    /// Classifies an optional HTTP status code.
    ///
    /// Failures without a status code are fatal.
    pub fn from_status(status_code: Option<u16>) -> Self {
        match status_code {
            Some(code) if TRANSIENT_STATUS_CODES.contains(&code) => ErrorKind::Transient,
            _ => ErrorKind::Fatal,
        }
    }

    /// Returns true if this error is retriable.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ErrorKind::Transient)
    }
}

/// A tracker error with categorization for retry decisions.
#[derive(Debug, Error)]
pub struct TrackerError {
    /// The kind of error (transient or fatal).
    pub kind: ErrorKind,

    /// The HTTP status code, if available.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "tracker error (HTTP {}): {}", code, self.message),
            None => write!(f, "tracker error: {}", self.message),
        }
    }
}

impl TrackerError {
    /// Creates an error from a status code, classifying it.
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::from_status(Some(status_code)),
            status_code: Some(status_code),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a fatal error without a status code or source.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Fatal,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_retriable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_statuses_are_retriable() {
        for code in TRANSIENT_STATUS_CODES {
            assert_eq!(ErrorKind::from_status(Some(code)), ErrorKind::Transient);
            assert!(TrackerError::from_status(code, "upstream down").is_transient());
        }
    }

    #[test]
    fn other_statuses_are_fatal() {
        for code in [400, 401, 403, 404, 422, 429, 501, 505, 520, 523] {
            assert_eq!(
                ErrorKind::from_status(Some(code)),
                ErrorKind::Fatal,
                "status {code} should be fatal"
            );
        }
    }

    #[test]
    fn missing_status_is_fatal() {
        assert_eq!(ErrorKind::from_status(None), ErrorKind::Fatal);
        assert!(!TrackerError::fatal("connection reset").is_transient());
    }

    #[test]
    fn display_includes_status_when_present() {
        let err = TrackerError::from_status(503, "service unavailable");
        assert_eq!(err.to_string(), "tracker error (HTTP 503): service unavailable");

        let err = TrackerError::fatal("bad payload");
        assert_eq!(err.to_string(), "tracker error: bad payload");
    }
}
