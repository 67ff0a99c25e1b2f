use chrono::{DateTime, Utc};
use std::time::Duration;

pub type HostResult<T> = Result<T, HostError>;

/// Longest backoff for 5xx/transport failures.
const MAX_BACKOFF_SECS: u64 = 300;

#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    #[error("rate limited until {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("upstream returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("request rejected with {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    Schema(String),
}

impl HostError {
    /// Rate limits, 5xx and transport failures are worth retrying; everything
    /// else means the unit should be skipped.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HostError::RateLimited { .. } | HostError::Server { .. } | HostError::Transport(_)
        )
    }

    /// Retry delay for a transient failure. Rate limits wait for the reported
    /// reset instead of a fixed backoff.
    pub fn retry_delay(&self, attempt: u32, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            HostError::RateLimited { reset_at } => {
                let wait = (*reset_at - now).num_seconds().max(0) as u64;
                Some(Duration::from_secs(wait + 1))
            }
            HostError::Server { .. } | HostError::Transport(_) => {
                let secs = 2u64.saturating_pow(attempt.min(16)).min(MAX_BACKOFF_SECS);
                Some(Duration::from_secs(secs.max(1)))
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HostError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            HostError::Schema(err.to_string())
        } else {
            HostError::Transport(err.to_string())
        }
    }
}
