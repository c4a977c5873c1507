//! In-memory mirror of open journal issues and their comments.
//!
//! The cache is the single owner of issue and comment records. Each apply call
//! diffs an authoritative snapshot from the tracker against the cached records
//! and emits a `ChangeEvent` for every addition or modification. Identical
//! payloads never emit, so repeated polls of an unchanged tracker are silent.
//!
//! # Invariants
//!
//! - Every cached issue is open; issues missing from a snapshot (or reported
//!   closed) are removed eagerly, together with their comments
//! - At most one record per issue number and per (issue number, comment id)
//! - `tracked_issue_numbers()` is exactly the set of cached issue numbers
//!
//! # Event delivery
//!
//! Handlers run synchronously, in registration order, before the apply call
//! returns. They are invoked after the state lock is released, so a handler may
//! read the cache. Handlers must not register further handlers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, instrument, trace, warn};

use crate::types::{ChangeEvent, ChangeType, Comment, CommentId, Issue, IssueNumber};

/// A registered change handler.
pub type EventHandler = Box<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Counts of what a single apply call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub added: usize,
    pub modified: usize,
    /// Issues dropped because the snapshot no longer reports them as open.
    pub removed: Vec<IssueNumber>,
}

impl ApplySummary {
    /// Returns true if the apply call changed nothing.
    pub fn is_unchanged(&self) -> bool {
        self.added == 0 && self.modified == 0 && self.removed.is_empty()
    }

    fn record(&mut self, change: ChangeType) {
        match change {
            ChangeType::Added => self.added += 1,
            ChangeType::Modified => self.modified += 1,
        }
    }
}

#[derive(Debug)]
struct TrackedIssue {
    issue: Issue,
    comments: BTreeMap<CommentId, Comment>,
}

#[derive(Debug, Default)]
struct CacheState {
    issues: BTreeMap<IssueNumber, TrackedIssue>,
}

/// The journal cache.
///
/// Shared as `Arc<JournalCache>` between the poller (the only writer), the
/// notification fanout, and the HTTP layer.
#[derive(Default)]
pub struct JournalCache {
    state: RwLock<CacheState>,

    /// Serializes apply calls so diffs and their event dispatch never interleave.
    apply_guard: Mutex<()>,

    issue_handlers: RwLock<Vec<EventHandler>>,
    comment_handlers: RwLock<Vec<EventHandler>>,
}

impl JournalCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `ChangeEvent::IssueChanged` events.
    pub fn on_issue_changed(&self, handler: impl Fn(&ChangeEvent) + Send + Sync + 'static) {
        write_lock(&self.issue_handlers).push(Box::new(handler));
    }

    /// Registers a handler for `ChangeEvent::CommentChanged` events.
    pub fn on_comment_changed(&self, handler: impl Fn(&ChangeEvent) + Send + Sync + 'static) {
        write_lock(&self.comment_handlers).push(Box::new(handler));
    }

    /// Replaces the set of open issues with an authoritative snapshot.
    ///
    /// New or changed open issues are stored and emitted. Cached issues that are
    /// absent from the snapshot, or present but closed, are removed silently.
    /// If the snapshot repeats an issue number, the last record wins.
    pub fn apply_issue_snapshot(&self, issues: impl IntoIterator<Item = Issue>) -> ApplySummary {
        let _guard = lock(&self.apply_guard);

        let mut incoming: BTreeMap<IssueNumber, Issue> = BTreeMap::new();
        for issue in issues {
            incoming.insert(issue.number, issue);
        }
        incoming.retain(|_, issue| issue.is_open());

        let mut summary = ApplySummary::default();
        let mut events = Vec::new();
        {
            let mut state = write_lock(&self.state);

            state.issues.retain(|number, _| {
                let keep = incoming.contains_key(number);
                if !keep {
                    summary.removed.push(*number);
                }
                keep
            });

            for (number, issue) in incoming {
                let change = match state.issues.get_mut(&number) {
                    Some(tracked) if tracked.issue == issue => continue,
                    Some(tracked) => {
                        tracked.issue = issue.clone();
                        ChangeType::Modified
                    }
                    None => {
                        state.issues.insert(
                            number,
                            TrackedIssue {
                                issue: issue.clone(),
                                comments: BTreeMap::new(),
                            },
                        );
                        ChangeType::Added
                    }
                };
                summary.record(change);
                events.push(ChangeEvent::IssueChanged { change, issue });
            }
        }

        debug!(
            added = summary.added,
            modified = summary.modified,
            removed = summary.removed.len(),
            "Applied issue snapshot"
        );
        self.dispatch(&self.issue_handlers, &events);
        summary
    }

    /// Merges the comments of one issue into the cache.
    ///
    /// New or changed comments are stored and emitted with the issue's resource
    /// as owner. Comments are never removed by this call. Does nothing if the
    /// issue is not tracked.
    #[instrument(skip(self, comments), fields(issue = %issue_number))]
    pub fn apply_comment_snapshot(
        &self,
        issue_number: IssueNumber,
        comments: impl IntoIterator<Item = Comment>,
    ) -> ApplySummary {
        let _guard = lock(&self.apply_guard);

        let mut summary = ApplySummary::default();
        let mut events = Vec::new();
        {
            let mut state = write_lock(&self.state);
            let Some(tracked) = state.issues.get_mut(&issue_number) else {
                debug!("Ignoring comments for untracked issue");
                return summary;
            };
            let owner = tracked.issue.resource.clone();

            for comment in comments {
                if comment.issue_number != issue_number {
                    warn!(
                        comment = %comment.id,
                        belongs_to = %comment.issue_number,
                        "Ignoring comment that belongs to another issue"
                    );
                    continue;
                }

                let change = match tracked.comments.get(&comment.id) {
                    Some(existing) if *existing == comment => continue,
                    Some(_) => ChangeType::Modified,
                    None => ChangeType::Added,
                };
                tracked.comments.insert(comment.id, comment.clone());
                summary.record(change);
                events.push(ChangeEvent::CommentChanged {
                    change,
                    comment,
                    owner: owner.clone(),
                });
            }
        }

        trace!(
            added = summary.added,
            modified = summary.modified,
            "Applied comment snapshot"
        );
        self.dispatch(&self.comment_handlers, &events);
        summary
    }

    /// Returns the numbers of all currently tracked (open) issues.
    pub fn tracked_issue_numbers(&self) -> BTreeSet<IssueNumber> {
        read_lock(&self.state).issues.keys().copied().collect()
    }

    /// Returns a copy of every tracked issue, ordered by number.
    pub fn issues(&self) -> Vec<Issue> {
        read_lock(&self.state)
            .issues
            .values()
            .map(|tracked| tracked.issue.clone())
            .collect()
    }

    /// Returns a copy of one tracked issue.
    pub fn issue(&self, number: IssueNumber) -> Option<Issue> {
        read_lock(&self.state)
            .issues
            .get(&number)
            .map(|tracked| tracked.issue.clone())
    }

    /// Returns a copy of the cached comments of a tracked issue, ordered by ID.
    ///
    /// Returns `None` if the issue is not tracked.
    pub fn comments(&self, number: IssueNumber) -> Option<Vec<Comment>> {
        read_lock(&self.state)
            .issues
            .get(&number)
            .map(|tracked| tracked.comments.values().cloned().collect())
    }

    /// Returns the number of tracked issues.
    pub fn len(&self) -> usize {
        read_lock(&self.state).issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dispatch(&self, handlers: &RwLock<Vec<EventHandler>>, events: &[ChangeEvent]) {
        if events.is_empty() {
            return;
        }
        let handlers = read_lock(handlers);
        for event in events {
            for handler in handlers.iter() {
                handler(event);
            }
        }
    }
}

impl std::fmt::Debug for JournalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalCache")
            .field("issues", &self.len())
            .finish_non_exhaustive()
    }
}

// Handlers run outside the state lock, so a poisoned lock never guards a
// half-applied snapshot.

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{make_comment, make_issue};
    use crate::types::{IssueState, ResourceRef};
    use std::sync::Arc;

    /// Records every event the cache emits, per stream.
    fn recording_cache() -> (Arc<JournalCache>, Arc<Mutex<Vec<ChangeEvent>>>) {
        let cache = Arc::new(JournalCache::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let issue_seen = seen.clone();
        cache.on_issue_changed(move |event| issue_seen.lock().unwrap().push(event.clone()));
        let comment_seen = seen.clone();
        cache.on_comment_changed(move |event| comment_seen.lock().unwrap().push(event.clone()));

        (cache, seen)
    }

    fn numbers(values: &[u64]) -> BTreeSet<IssueNumber> {
        values.iter().copied().map(IssueNumber).collect()
    }

    // ─── Issue snapshots ───

    #[test]
    fn same_snapshot_twice_emits_once() {
        let (cache, seen) = recording_cache();
        let snapshot = vec![make_issue(1, "garden-a", "s1"), make_issue(2, "garden-a", "s2")];

        let first = cache.apply_issue_snapshot(snapshot.clone());
        let second = cache.apply_issue_snapshot(snapshot);

        assert_eq!(first.added, 2);
        assert!(second.is_unchanged());
        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.change() == ChangeType::Added));
    }

    #[test]
    fn issue_missing_from_snapshot_is_removed_silently() {
        let (cache, seen) = recording_cache();
        cache.apply_issue_snapshot(vec![make_issue(7, "garden-a", "s1")]);
        assert_eq!(cache.tracked_issue_numbers(), numbers(&[7]));

        let summary = cache.apply_issue_snapshot(vec![make_issue(8, "garden-a", "s2")]);

        assert_eq!(summary.removed, vec![IssueNumber(7)]);
        assert_eq!(cache.tracked_issue_numbers(), numbers(&[8]));
        assert!(cache.issue(IssueNumber(7)).is_none());
        // One event per addition; the removal itself is not broadcast.
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn closed_issue_in_snapshot_is_not_tracked() {
        let (cache, seen) = recording_cache();
        cache.apply_issue_snapshot(vec![make_issue(3, "garden-a", "s1")]);

        let mut closed = make_issue(3, "garden-a", "s1");
        closed.state = IssueState::Closed;
        let mut new_closed = make_issue(4, "garden-a", "s2");
        new_closed.state = IssueState::Closed;
        let summary = cache.apply_issue_snapshot(vec![closed, new_closed]);

        assert_eq!(summary.removed, vec![IssueNumber(3)]);
        assert_eq!(summary.added, 0);
        assert!(cache.is_empty());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn changed_payload_emits_modified() {
        let (cache, seen) = recording_cache();
        cache.apply_issue_snapshot(vec![make_issue(1, "garden-a", "s1")]);

        let mut relabelled = make_issue(1, "garden-a", "s1");
        relabelled.labels.push("critical".to_string());
        let summary = cache.apply_issue_snapshot(vec![relabelled.clone()]);

        assert_eq!(summary.modified, 1);
        assert_eq!(cache.issue(IssueNumber(1)), Some(relabelled.clone()));
        let events = seen.lock().unwrap();
        assert_eq!(
            events.last(),
            Some(&ChangeEvent::IssueChanged {
                change: ChangeType::Modified,
                issue: relabelled,
            })
        );
    }

    #[test]
    fn duplicate_numbers_in_snapshot_keep_last_record() {
        let (cache, seen) = recording_cache();
        let mut later = make_issue(5, "garden-a", "s1");
        later.title = "Later title".to_string();

        cache.apply_issue_snapshot(vec![make_issue(5, "garden-a", "s1"), later.clone()]);

        assert_eq!(cache.issues(), vec![later]);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn issue_events_are_emitted_in_number_order() {
        let (cache, seen) = recording_cache();
        cache.apply_issue_snapshot(vec![
            make_issue(9, "garden-a", "s9"),
            make_issue(2, "garden-a", "s2"),
            make_issue(5, "garden-a", "s5"),
        ]);

        let order: Vec<u64> = seen
            .lock()
            .unwrap()
            .iter()
            .map(|e| match e {
                ChangeEvent::IssueChanged { issue, .. } => issue.number.0,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(order, vec![2, 5, 9]);
    }

    // ─── Comment snapshots ───

    #[test]
    fn comments_emit_with_owner_resource() {
        let (cache, seen) = recording_cache();
        cache.apply_issue_snapshot(vec![make_issue(7, "garden-x", "shoot1")]);
        seen.lock().unwrap().clear();

        let summary = cache.apply_comment_snapshot(
            IssueNumber(7),
            vec![make_comment(7, 100, "first"), make_comment(7, 101, "second")],
        );

        assert_eq!(summary.added, 2);
        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 2);
        for event in events.iter() {
            match event {
                ChangeEvent::CommentChanged { owner, change, .. } => {
                    assert_eq!(owner, &ResourceRef::new("garden-x", "shoot1"));
                    assert_eq!(*change, ChangeType::Added);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[test]
    fn refetching_unchanged_comments_is_silent() {
        let (cache, seen) = recording_cache();
        cache.apply_issue_snapshot(vec![make_issue(7, "garden-x", "shoot1")]);
        let comments = vec![make_comment(7, 100, "first")];

        cache.apply_comment_snapshot(IssueNumber(7), comments.clone());
        let again = cache.apply_comment_snapshot(IssueNumber(7), comments);

        assert!(again.is_unchanged());
        assert_eq!(seen.lock().unwrap().len(), 2); // issue added + comment added
    }

    #[test]
    fn edited_comment_emits_modified() {
        let (cache, seen) = recording_cache();
        cache.apply_issue_snapshot(vec![make_issue(7, "garden-x", "shoot1")]);
        cache.apply_comment_snapshot(IssueNumber(7), vec![make_comment(7, 100, "first")]);

        let summary =
            cache.apply_comment_snapshot(IssueNumber(7), vec![make_comment(7, 100, "edited")]);

        assert_eq!(summary.modified, 1);
        assert_eq!(
            cache.comments(IssueNumber(7)).unwrap()[0].body,
            "edited".to_string()
        );
        assert_eq!(
            seen.lock().unwrap().last().map(ChangeEvent::change),
            Some(ChangeType::Modified)
        );
    }

    #[test]
    fn comments_missing_from_snapshot_are_kept() {
        let (cache, _seen) = recording_cache();
        cache.apply_issue_snapshot(vec![make_issue(7, "garden-x", "shoot1")]);
        cache.apply_comment_snapshot(
            IssueNumber(7),
            vec![make_comment(7, 100, "first"), make_comment(7, 101, "second")],
        );

        cache.apply_comment_snapshot(IssueNumber(7), vec![make_comment(7, 101, "second")]);

        let ids: Vec<_> = cache
            .comments(IssueNumber(7))
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![CommentId(100), CommentId(101)]);
    }

    #[test]
    fn comments_for_untracked_issue_are_ignored() {
        let (cache, seen) = recording_cache();

        let summary =
            cache.apply_comment_snapshot(IssueNumber(42), vec![make_comment(42, 1, "orphan")]);

        assert!(summary.is_unchanged());
        assert!(cache.comments(IssueNumber(42)).is_none());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn comments_of_other_issues_are_ignored() {
        let (cache, seen) = recording_cache();
        cache.apply_issue_snapshot(vec![make_issue(7, "garden-x", "shoot1")]);
        seen.lock().unwrap().clear();

        cache.apply_comment_snapshot(IssueNumber(7), vec![make_comment(8, 1, "misrouted")]);

        assert_eq!(cache.comments(IssueNumber(7)), Some(Vec::new()));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn removing_an_issue_drops_its_comments() {
        let (cache, seen) = recording_cache();
        cache.apply_issue_snapshot(vec![make_issue(7, "garden-x", "shoot1")]);
        cache.apply_comment_snapshot(IssueNumber(7), vec![make_comment(7, 100, "first")]);

        cache.apply_issue_snapshot(Vec::new());
        cache.apply_issue_snapshot(vec![make_issue(7, "garden-x", "shoot1")]);
        seen.lock().unwrap().clear();

        // A reopened issue starts with an empty comment set, so its comments are re-announced.
        cache.apply_comment_snapshot(IssueNumber(7), vec![make_comment(7, 100, "first")]);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    // ─── Handlers ───

    #[test]
    fn handlers_run_in_registration_order() {
        let cache = JournalCache::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for id in 0..3 {
            let order = order.clone();
            cache.on_issue_changed(move |_| order.lock().unwrap().push(id));
        }

        cache.apply_issue_snapshot(vec![make_issue(1, "garden-a", "s1")]);

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn issue_handlers_do_not_see_comment_events() {
        let cache = JournalCache::new();
        let issue_events = Arc::new(Mutex::new(0));
        let counter = issue_events.clone();
        cache.on_issue_changed(move |_| *counter.lock().unwrap() += 1);

        cache.apply_issue_snapshot(vec![make_issue(1, "garden-a", "s1")]);
        cache.apply_comment_snapshot(IssueNumber(1), vec![make_comment(1, 10, "hi")]);

        assert_eq!(*issue_events.lock().unwrap(), 1);
    }

    #[test]
    fn handlers_can_read_the_cache() {
        let cache = Arc::new(JournalCache::new());
        let observed = Arc::new(Mutex::new(BTreeSet::new()));

        let reader = Arc::downgrade(&cache);
        let sink = observed.clone();
        cache.on_issue_changed(move |_| {
            if let Some(cache) = reader.upgrade() {
                *sink.lock().unwrap() = cache.tracked_issue_numbers();
            }
        });

        cache.apply_issue_snapshot(vec![make_issue(1, "garden-a", "s1")]);

        assert_eq!(*observed.lock().unwrap(), numbers(&[1]));
    }
}
