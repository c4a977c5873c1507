//! Journal poller: keeps the cache in step with the tracker.
//!
//! # Architecture
//!
//! ```text
//! Poller ──► IssueTracker (fetch) ──► JournalCache (diff + emit) ──► NotificationFanout
//! ```
//!
//! # Module Structure
//!
//! - [`config`]: Operating mode (one-shot or periodic) and retry tuning
//! - [`scheduler`]: The reconciliation cycle and the poller state machine

mod config;
mod scheduler;


pub use config::{SyncConfig, SyncMode};
pub use scheduler::{CommentFailure, CycleReport, Poller, ReloadOutcome, SyncScheduler};
