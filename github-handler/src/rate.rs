use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{HostError, HostResult};

/// Remaining/reset pair reported alongside every upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimit {
    /// Budget for responses that carried no rate-limit headers.
    pub fn unknown() -> Self {
        Self {
            remaining: u32::MAX,
            reset_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub data: T,
    pub rate: RateLimit,
}

impl<T> Fetched<T> {
    pub fn new(data: T, rate: RateLimit) -> Self {
        Self { data, rate }
    }
}

/// Tracks the last reported budget and sleeps until reset when it runs low,
/// so handlers slow down instead of failing.
pub struct RateGate {
    min_remaining: u32,
    max_wait: Duration,
    last: Mutex<Option<RateLimit>>,
}

impl RateGate {
    pub fn new(min_remaining: u32, max_wait: Duration) -> Self {
        Self {
            min_remaining,
            max_wait,
            last: Mutex::new(None),
        }
    }

    pub fn observe(&self, rate: RateLimit) {
        *self.last.lock() = Some(rate);
    }

    pub fn last(&self) -> Option<RateLimit> {
        *self.last.lock()
    }

    /// How long to hold off before the next call, if at all.
    pub fn pending_wait(&self, now: DateTime<Utc>) -> Option<Duration> {
        let rate = (*self.last.lock())?;
        if rate.remaining >= self.min_remaining || rate.reset_at <= now {
            return None;
        }
        let millis = (rate.reset_at - now).num_milliseconds().max(0) as u64;
        Some(Duration::from_millis(millis).min(self.max_wait))
    }

    pub async fn wait_for_budget(&self) {
        if let Some(wait) = self.pending_wait(Utc::now()) {
            info!("rate budget low, sleeping {:?} until reset", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Waits for budget, performs `call`, and records the budget it reports.
    /// A rate-limit rejection is recorded as an exhausted budget before the
    /// error is handed back for a reset-aware retry.
    pub async fn fetch<T, F, Fut>(&self, call: F) -> HostResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = HostResult<Fetched<T>>>,
    {
        self.wait_for_budget().await;
        match call().await {
            Ok(fetched) => {
                self.observe(fetched.rate);
                Ok(fetched.data)
            }
            Err(HostError::RateLimited { reset_at }) => {
                warn!("rate limited until {}", reset_at);
                self.observe(RateLimit {
                    remaining: 0,
                    reset_at,
                });
                Err(HostError::RateLimited { reset_at })
            }
            Err(err) => Err(err),
        }
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(50, Duration::from_secs(15 * 60))
    }
}
