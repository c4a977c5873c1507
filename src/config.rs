//! Process configuration read from the environment.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `JOURNAL_SYNC_GITHUB_OWNER` | Owner of the journal repository | none |
//! | `JOURNAL_SYNC_GITHUB_REPO` | Name of the journal repository | none |
//! | `JOURNAL_SYNC_GITHUB_TOKEN` | Token used to read it | none |
//! | `JOURNAL_SYNC_GITHUB_API_URL` | GitHub Enterprise API base | api.github.com |
//! | `JOURNAL_SYNC_POLL_INTERVAL_SECS` | Seconds between cycles; missing, `0` or unparseable runs once | one-shot |
//! | `JOURNAL_SYNC_BIND_ADDR` | HTTP listen address | `0.0.0.0:3000` |
//! | `JOURNAL_SYNC_CHANNEL_CAPACITY` | Per-topic subscriber buffer | 256 |
//!
//! The three repository variables go together: all absent disables the
//! poller, all present enables it, anything in between is an error.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::warn;

use crate::fanout::DEFAULT_CHANNEL_CAPACITY;
use crate::sync::SyncMode;
use crate::types::RepoId;

pub const OWNER_VAR: &str = "JOURNAL_SYNC_GITHUB_OWNER";
pub const REPO_VAR: &str = "JOURNAL_SYNC_GITHUB_REPO";
pub const TOKEN_VAR: &str = "JOURNAL_SYNC_GITHUB_TOKEN";
pub const API_URL_VAR: &str = "JOURNAL_SYNC_GITHUB_API_URL";
pub const POLL_INTERVAL_VAR: &str = "JOURNAL_SYNC_POLL_INTERVAL_SECS";
pub const BIND_ADDR_VAR: &str = "JOURNAL_SYNC_BIND_ADDR";
pub const CHANNEL_CAPACITY_VAR: &str = "JOURNAL_SYNC_CHANNEL_CAPACITY";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Errors in the process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Some, but not all, of the repository variables are set.
    #[error("incomplete tracker configuration: {missing:?} must be set alongside the others")]
    IncompleteTracker { missing: Vec<&'static str> },

    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where and how to reach the tracker.
#[derive(Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub repo: RepoId,
    pub token: String,
    pub api_url: Option<String>,
}

impl std::fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("repo", &self.repo)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// Everything the binary needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `None` disables the poller.
    pub tracker: Option<TrackerConfig>,
    pub sync_mode: SyncMode,
    pub bind_addr: SocketAddr,
    pub channel_capacity: usize,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let tracker = tracker_config(&get)?;
        let sync_mode = SyncMode::from_interval_secs(get(POLL_INTERVAL_VAR).and_then(|raw| {
            let parsed = raw.trim().parse::<u64>().ok();
            if parsed.is_none() {
                warn!(var = POLL_INTERVAL_VAR, value = %raw, "Unparseable poll interval, syncing once");
            }
            parsed
        }));

        let bind_addr_raw = get(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: BIND_ADDR_VAR,
                value: bind_addr_raw.clone(),
                reason: e.to_string(),
            })?;

        let channel_capacity = match get(CHANNEL_CAPACITY_VAR) {
            None => DEFAULT_CHANNEL_CAPACITY,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        var: CHANNEL_CAPACITY_VAR,
                        value: raw,
                        reason: "must be positive".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: CHANNEL_CAPACITY_VAR,
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            },
        };

        Ok(AppConfig {
            tracker,
            sync_mode,
            bind_addr,
            channel_capacity,
        })
    }
}

fn tracker_config(
    get: &impl Fn(&str) -> Option<String>,
) -> Result<Option<TrackerConfig>, ConfigError> {
    let owner = get(OWNER_VAR);
    let repo = get(REPO_VAR);
    let token = get(TOKEN_VAR);

    match (owner, repo, token) {
        (Some(owner), Some(repo), Some(token)) => Ok(Some(TrackerConfig {
            repo: RepoId::new(owner.trim(), repo.trim()),
            token,
            api_url: get(API_URL_VAR),
        })),
        (None, None, None) => Ok(None),
        (owner, repo, token) => {
            let missing = [(OWNER_VAR, owner), (REPO_VAR, repo), (TOKEN_VAR, token)]
                .into_iter()
                .filter(|(_, value)| value.is_none())
                .map(|(var, _)| var)
                .collect();
            Err(ConfigError::IncompleteTracker { missing })
        }
    }
}
