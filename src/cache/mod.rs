//! Journal cache: the in-memory mirror of open issues and their comments.
//!
//! See [`journal`] for the diffing rules and event delivery guarantees.

mod journal;

pub use journal::{ApplySummary, EventHandler, JournalCache};
