//! GitHub-backed issue tracker.
//!
//! Key features:
//! - Pages through open issues and comments with octocrab
//! - Skips pull requests and issues without a `[namespace/name]` title prefix
//! - Classifies octocrab failures by HTTP status for the retry policy

mod client;
mod error;

pub use client::OctocrabClient;
