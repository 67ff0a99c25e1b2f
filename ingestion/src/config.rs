use serde::Deserialize;
use std::time::Duration;

/// 采集流程参数 (ingestion pipeline limits)
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestionConfig {
    pub max_repos: usize,
    pub max_repo_pages: u32,
    pub repo_max_age_days: i64,
    pub max_commit_pages: u32,
    pub max_pr_pages: u32,
    pub classify_batch: u64,
    pub classify_requeue_delay_ms: u64,
    pub vector_defer_ms: u64,
    pub worker_concurrency: usize,
    pub max_attempts: u32,
    pub stale_after_hours: i64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_repos: 20,
            max_repo_pages: 5,
            repo_max_age_days: 3 * 365,
            max_commit_pages: 3,
            max_pr_pages: 2,
            classify_batch: 25,
            classify_requeue_delay_ms: 2000,
            vector_defer_ms: 30_000,
            worker_concurrency: 8,
            max_attempts: 5,
            stale_after_hours: 6,
        }
    }
}

impl IngestionConfig {
    pub fn classify_requeue_delay(&self) -> Duration {
        Duration::from_millis(self.classify_requeue_delay_ms)
    }

    pub fn vector_defer(&self) -> Duration {
        Duration::from_millis(self.vector_defer_ms)
    }

    pub fn stale_after(&self) -> chrono::Duration {
        chrono::Duration::hours(self.stale_after_hours)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.worker_concurrency == 0 {
            anyhow::bail!("worker_concurrency must be at least 1");
        }
        if self.max_attempts == 0 {
            anyhow::bail!("max_attempts must be at least 1");
        }
        if self.classify_batch == 0 {
            anyhow::bail!("classify_batch must be at least 1");
        }
        Ok(())
    }
}
