use chrono::{DateTime, Utc};
use github_handler::HostError;
use std::time::Duration;

const MAX_BACKOFF_SECS: u64 = 300;

/// What a handler did with its task, short of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Done,
    /// Nothing to do: the developer vanished, opted out, or the task is stale.
    Skipped(String),
    /// Batch continuation; a fresh envelope is enqueued after the delay.
    Requeued(Duration),
    /// Not ready yet; the same envelope comes back after the delay, counting
    /// against its attempts.
    Deferred(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Upstream(#[from] HostError),

    #[error("store error: {0:#}")]
    Store(anyhow::Error),

    /// Embedding or label-model failure.
    #[error("service error: {0:#}")]
    Service(anyhow::Error),
}

impl TaskError {
    /// `None` means retrying cannot help and the envelope should be dropped.
    pub fn retry_delay(&self, attempt: u32, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            TaskError::Upstream(e) => e.retry_delay(attempt, now),
            TaskError::Store(_) | TaskError::Service(_) => {
                let secs = 2u64.saturating_pow(attempt.min(16)).min(MAX_BACKOFF_SECS);
                Some(Duration::from_secs(secs.max(1)))
            }
        }
    }
}
