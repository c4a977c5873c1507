//! Journal Sync - mirrors open GitHub journal issues into an in-process cache
//! and fans out change notifications to per-topic subscribers.
//!
//! This library provides the sync engine; the binary wires it to GitHub and an
//! HTTP server.

pub mod cache;
pub mod config;
pub mod fanout;
pub mod github;
pub mod retry;
pub mod server;
pub mod sync;
pub mod tracker;
pub mod types;

#[cfg(test)]
pub mod test_utils;
