//! The reconciliation loop.
//!
//! One cycle is:
//!
//! 1. Reload all open issues through the retry policy. A fatal failure abandons
//!    the cycle; success replaces the cache's issue set.
//! 2. Read the tracked issue numbers as they stand after step 1.
//! 3. Refresh the comments of each tracked issue, one at a time, with a single
//!    attempt each. A failure is logged and skipped; it never aborts the pass.
//!
//! Cycles run to completion before the next one is scheduled, so they never
//! overlap and the poller is the cache's only writer.

use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::cache::{ApplySummary, JournalCache};
use crate::retry::{FailedAttempt, RetryResult, retry_with_backoff};
use crate::tracker::{IssueTracker, TrackerError};
use crate::types::IssueNumber;

use super::config::{SyncConfig, SyncMode};

/// Outcome of the full issue reload at the start of a cycle.
#[derive(Debug)]
pub enum ReloadOutcome {
    /// The snapshot was fetched and applied.
    Applied(ApplySummary),

    /// The fetch failed with a non-retriable error; the cycle was abandoned.
    Fatal { error: TrackerError, attempts: u32 },

    /// Shutdown was requested before the fetch succeeded.
    Cancelled { attempts: u32 },
}

/// A comment fetch that failed during the comment pass.
#[derive(Debug)]
pub struct CommentFailure {
    pub issue: IssueNumber,
    pub error: TrackerError,
}

/// What a single reconciliation cycle did.
#[derive(Debug)]
pub struct CycleReport {
    pub reload: ReloadOutcome,

    /// Issues whose comments were fetched and applied, in processing order.
    pub comments_refreshed: Vec<IssueNumber>,

    /// Issues whose comment fetch failed.
    pub comment_failures: Vec<CommentFailure>,

    /// True if shutdown interrupted the comment pass.
    pub interrupted: bool,
}

impl CycleReport {
    fn abandoned(reload: ReloadOutcome) -> Self {
        CycleReport {
            reload,
            comments_refreshed: Vec::new(),
            comment_failures: Vec::new(),
            interrupted: false,
        }
    }

    /// Returns true if the reload succeeded and every comment fetch succeeded.
    pub fn is_complete(&self) -> bool {
        matches!(self.reload, ReloadOutcome::Applied(_))
            && self.comment_failures.is_empty()
            && !self.interrupted
    }
}

/// Drives reconciliation cycles against one tracker.
pub struct SyncScheduler<T> {
    tracker: T,
    cache: Arc<JournalCache>,
    config: SyncConfig,
}

impl<T> SyncScheduler<T>
where
    T: IssueTracker + Sync,
{
    pub fn new(tracker: T, cache: Arc<JournalCache>, config: SyncConfig) -> Self {
        SyncScheduler {
            tracker,
            cache,
            config,
        }
    }

    /// Runs cycles according to the configured mode.
    ///
    /// Returns the number of cycles started. In periodic mode this only returns
    /// once `shutdown` is cancelled.
    #[instrument(skip_all, fields(mode = ?self.config.mode))]
    pub async fn run(self, shutdown: CancellationToken) -> u64 {
        match self.config.mode {
            SyncMode::OneShot => {
                info!("Running a single journal sync cycle");
                self.run_cycle(&shutdown).await;
                1
            }
            SyncMode::Periodic(interval) => {
                info!(interval_secs = interval.as_secs(), "Starting periodic journal sync");
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                let mut cycles = 0;

                loop {
                    tokio::select! {
                        biased;

                        _ = shutdown.cancelled() => {
                            info!(cycles, "Shutdown signal received, stopping journal sync");
                            break;
                        }
                        _ = ticker.tick() => {}
                    }

                    cycles += 1;
                    self.run_cycle(&shutdown).await;
                }

                cycles
            }
        }
    }

    /// Runs one reconciliation cycle.
    #[instrument(skip_all)]
    pub async fn run_cycle(&self, shutdown: &CancellationToken) -> CycleReport {
        let result = retry_with_backoff(
            self.config.retry,
            shutdown,
            |error: &TrackerError| error.kind,
            |failed: &FailedAttempt<'_, TrackerError>| match failed.next_delay {
                Some(delay) => info!(
                    attempt = failed.attempt,
                    error = %failed.error,
                    retry_in = ?delay,
                    "Attempt failed, will retry to fetch journals"
                ),
                None => warn!(
                    attempt = failed.attempt,
                    error = %failed.error,
                    "Attempt failed with non-retriable error"
                ),
            },
            || self.tracker.list_open_issues(),
        )
        .await;

        let reload = match result {
            RetryResult::Success(issues) => {
                let fetched = issues.len();
                let summary = self.cache.apply_issue_snapshot(issues);
                info!(fetched, "Successfully fetched journals");
                ReloadOutcome::Applied(summary)
            }
            RetryResult::Fatal { error, attempts } => {
                error!(error = %error, attempts, "Failed to fetch journals");
                return CycleReport::abandoned(ReloadOutcome::Fatal { error, attempts });
            }
            RetryResult::Cancelled { attempts, .. } => {
                debug!(attempts, "Journal fetch cancelled");
                return CycleReport::abandoned(ReloadOutcome::Cancelled { attempts });
            }
        };

        let mut report = CycleReport::abandoned(reload);
        for number in self.cache.tracked_issue_numbers() {
            let result = tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!(issue = %number, "Comment refresh interrupted by shutdown");
                    report.interrupted = true;
                    break;
                }
                result = self.tracker.list_comments(number) => result,
            };

            match result {
                Ok(comments) => {
                    self.cache.apply_comment_snapshot(number, comments);
                    report.comments_refreshed.push(number);
                }
                Err(error) => {
                    error!(issue = %number, error = %error, "Failed to fetch comments for issue");
                    report.comment_failures.push(CommentFailure {
                        issue: number,
                        error,
                    });
                }
            }
        }

        debug!(
            refreshed = report.comments_refreshed.len(),
            failed = report.comment_failures.len(),
            "Journal sync cycle finished"
        );
        report
    }
}

/// The poller's top-level state: disabled without a tracker, armed with one.
pub enum Poller<T> {
    /// No tracker configured; nothing is ever fetched or published.
    Disabled,

    /// Ready to run cycles.
    Armed(SyncScheduler<T>),
}

impl<T> Poller<T>
where
    T: IssueTracker + Sync,
{
    pub fn new(tracker: Option<T>, cache: Arc<JournalCache>, config: SyncConfig) -> Self {
        match tracker {
            Some(tracker) => Poller::Armed(SyncScheduler::new(tracker, cache, config)),
            None => {
                warn!("No issue tracker configured, journal sync is disabled");
                Poller::Disabled
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Poller::Armed(_))
    }

    /// Runs the poller; returns immediately with zero cycles when disabled.
    pub async fn run(self, shutdown: CancellationToken) -> u64 {
        match self {
            Poller::Disabled => 0,
            Poller::Armed(scheduler) => scheduler.run(shutdown).await,
        }
    }
}
