//! Administrative repairs for partially completed runs. Each one is safe to
//! run repeatedly.

use std::sync::Arc;

use chrono::{Duration, Utc};
use database::storage::RecordStore;
use model::{IngestionStatus, Task};
use serde::Serialize;
use tracing::info;

use crate::coordinator::LockTable;
use crate::queue::TaskQueue;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub repair: &'static str,
    pub examined: usize,
    pub repaired: usize,
}

pub struct Repairer {
    store: Arc<dyn RecordStore>,
    queue: Arc<dyn TaskQueue>,
    locks: Arc<LockTable>,
}

impl Repairer {
    pub fn new(store: Arc<dyn RecordStore>, queue: Arc<dyn TaskQueue>, locks: Arc<LockTable>) -> Self {
        Self { store, queue, locks }
    }

    /// Stuck `in_progress` developers that already have scores are complete.
    pub async fn repair_stuck_scored(&self, stale_after: Duration) -> anyhow::Result<RepairReport> {
        let now = Utc::now();
        let mut report = RepairReport {
            repair: "stuck-scored",
            ..Default::default()
        };
        for candidate in self
            .store
            .list_developers_by_status(IngestionStatus::InProgress)
            .await?
        {
            if !candidate.stuck_since(stale_after, now) || !candidate.has_scores() {
                continue;
            }
            report.examined += 1;
            let _guard = self.locks.lock(&candidate.id).await;
            // re-read under the lock; the run may have closed meanwhile
            let Some(mut developer) = self.store.get_developer(&candidate.id).await? else {
                continue;
            };
            let mut run = self.store.get_ingestion_run(&developer.id).await?;
            let watermark = run.as_ref().map_or(developer.updated_at, |r| r.started_at);
            if developer.mark_complete(watermark, now) {
                if let Some(run) = run.as_mut() {
                    run.finished_at = Some(now);
                    self.store.put_ingestion_run(run).await?;
                }
                self.store.upsert_developer(&developer).await?;
                report.repaired += 1;
            }
        }
        info!("repair {:?}", report);
        Ok(report)
    }

    /// Stuck `in_progress` developers without scores get scoring re-issued.
    pub async fn repair_stuck_unscored(&self, stale_after: Duration) -> anyhow::Result<RepairReport> {
        let now = Utc::now();
        let mut report = RepairReport {
            repair: "stuck-unscored",
            ..Default::default()
        };
        for developer in self
            .store
            .list_developers_by_status(IngestionStatus::InProgress)
            .await?
        {
            if !developer.stuck_since(stale_after, now) || developer.has_scores() {
                continue;
            }
            report.examined += 1;
            self.queue
                .enqueue(Task::ComputeScores {
                    developer_id: developer.id.clone(),
                })
                .await?;
            report.repaired += 1;
        }
        info!("repair {:?}", report);
        Ok(report)
    }

    /// `complete` with nothing behind it: purge, reset to `pending`, re-ingest.
    pub async fn repair_empty_complete(&self) -> anyhow::Result<RepairReport> {
        let now = Utc::now();
        let mut report = RepairReport {
            repair: "empty-complete",
            ..Default::default()
        };
        for candidate in self
            .store
            .list_developers_by_status(IngestionStatus::Complete)
            .await?
        {
            report.examined += 1;
            if candidate.opted_out || self.store.count_contributions(&candidate.id).await? > 0 {
                continue;
            }
            let _guard = self.locks.lock(&candidate.id).await;
            let Some(mut developer) = self.store.get_developer(&candidate.id).await? else {
                continue;
            };
            if developer.status != IngestionStatus::Complete {
                continue;
            }
            self.store.purge_developer_data(&developer.id).await?;
            developer.reset_pending(now);
            self.store.upsert_developer(&developer).await?;
            self.queue
                .enqueue(Task::Ingest {
                    username: developer.username.clone(),
                })
                .await?;
            report.repaired += 1;
        }
        info!("repair {:?}", report);
        Ok(report)
    }
}
