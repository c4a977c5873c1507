//! Scheduling configuration for the journal poller.
//!
//! The operating mode is chosen once at startup:
//!
//! - **OneShot**: no (or a zero) poll interval. One reconciliation cycle runs,
//!   then the poller stops. Used for on-demand refreshes.
//! - **Periodic**: a positive poll interval. The cycle repeats on a fixed timer
//!   for the lifetime of the process, starting immediately.

use std::time::Duration;

use crate::retry::RetryConfig;

/// How often reconciliation cycles run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Exactly one cycle.
    OneShot,

    /// A cycle every `interval`; cycles never overlap.
    Periodic(Duration),
}

impl SyncMode {
    /// Selects the mode from an optional interval in seconds.
    pub fn from_interval_secs(secs: Option<u64>) -> Self {
        match secs {
            Some(secs) if secs > 0 => SyncMode::Periodic(Duration::from_secs(secs)),
            _ => SyncMode::OneShot,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        match self {
            SyncMode::OneShot => None,
            SyncMode::Periodic(interval) => Some(*interval),
        }
    }
}

/// Configuration for the poller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncConfig {
    pub mode: SyncMode,

    /// Backoff for the full issue reload.
    pub retry: RetryConfig,
}

impl SyncConfig {
    pub fn new(mode: SyncMode) -> Self {
        SyncConfig {
            mode,
            retry: RetryConfig::DEFAULT,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}
