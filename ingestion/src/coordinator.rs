//! Per-developer fan-out/fan-in. State lives in the store (`IngestionRun` +
//! developer status); the lock table only linearizes updates per developer.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use database::storage::RecordStore;
use github_handler::{CodeHost, RateGate};
use model::{Developer, IngestionRun, IngestionStatus, Task};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::IngestionConfig;
use crate::discovery::{fetch_identity, metadata_from_listing, select_candidates};
use crate::error::TaskError;
use crate::queue::TaskQueue;

/// Sharded per-key async locks.
#[derive(Default)]
pub struct LockTable {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(key.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { run_id: Uuid, dispatched: usize },
    /// No candidate repos; complete without downstream work.
    CompletedEmpty,
    AlreadyRunning,
    OptedOut,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Stale run, finished developer, or a repeat report.
    Ignored,
    Recorded { completed: i32, dispatched: i32 },
    Completed,
}

pub struct Coordinator {
    host: Arc<dyn CodeHost>,
    gate: Arc<RateGate>,
    store: Arc<dyn RecordStore>,
    queue: Arc<dyn TaskQueue>,
    locks: Arc<LockTable>,
    config: IngestionConfig,
}

impl Coordinator {
    pub fn new(
        host: Arc<dyn CodeHost>,
        gate: Arc<RateGate>,
        store: Arc<dyn RecordStore>,
        queue: Arc<dyn TaskQueue>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            host,
            gate,
            store,
            queue,
            locks: Arc::new(LockTable::new()),
            config,
        }
    }

    pub fn locks(&self) -> Arc<LockTable> {
        self.locks.clone()
    }

    /// Opens a new run for `username`. Transient upstream errors are returned
    /// before any state changes, so the retried task starts from `pending`.
    pub async fn start(&self, username: &str) -> Result<StartOutcome, TaskError> {
        let id = Developer::normalize_id(username);
        let _guard = self.locks.lock(&id).await;
        let now = Utc::now();

        let mut developer = match self.store.get_developer(&id).await.map_err(TaskError::Store)? {
            Some(d) => d,
            None => {
                let d = Developer::new(username, now);
                self.store.upsert_developer(&d).await.map_err(TaskError::Store)?;
                d
            }
        };
        if developer.status == IngestionStatus::InProgress {
            debug!("{} already has a run in flight", id);
            return Ok(StartOutcome::AlreadyRunning);
        }
        if developer.opted_out {
            return Ok(StartOutcome::OptedOut);
        }

        let identity = fetch_identity(self.host.as_ref(), &self.gate, &self.config, username).await;
        let (user, repos) = match identity {
            Ok(found) => found,
            Err(e) if e.is_transient() => return Err(e.into()),
            Err(e) => return self.fail(developer, e.to_string()).await,
        };
        if user.is_bot() {
            return self.fail(developer, "bot account".to_owned()).await;
        }

        let candidates = select_candidates(&self.config, &user.login, repos, now);
        for repo in &candidates {
            self.store
                .merge_repo_metadata(metadata_from_listing(repo, now))
                .await
                .map_err(TaskError::Store)?;
        }

        developer.begin_ingestion(now);
        developer.github_id = Some(user.id);
        developer.username = user.login.clone();
        let mut run = IngestionRun::start(&id, candidates.len() as i32, now);

        if candidates.is_empty() {
            developer.mark_complete(run.started_at, now);
            run.finished_at = Some(now);
            self.store.put_ingestion_run(&run).await.map_err(TaskError::Store)?;
            self.store.upsert_developer(&developer).await.map_err(TaskError::Store)?;
            info!("{} has no candidate repos, complete", id);
            return Ok(StartOutcome::CompletedEmpty);
        }

        self.store.put_ingestion_run(&run).await.map_err(TaskError::Store)?;
        self.store.upsert_developer(&developer).await.map_err(TaskError::Store)?;
        for repo in &candidates {
            self.queue
                .enqueue(Task::AnalyzeRepo {
                    developer_id: id.clone(),
                    run_id: run.run_id,
                    repo: repo.full_name.clone(),
                })
                .await
                .map_err(TaskError::Store)?;
        }
        info!(
            "started run {} for {} over {} repos",
            run.run_id,
            id,
            candidates.len()
        );
        Ok(StartOutcome::Started {
            run_id: run.run_id,
            dispatched: candidates.len(),
        })
    }

    async fn fail(&self, mut developer: Developer, reason: String) -> Result<StartOutcome, TaskError> {
        let now = Utc::now();
        developer.begin_ingestion(now);
        developer.mark_failed(reason.clone(), now);
        self.store.upsert_developer(&developer).await.map_err(TaskError::Store)?;
        warn!("ingestion for {} failed: {}", developer.id, reason);
        Ok(StartOutcome::Failed(reason))
    }

    /// Fan-in callback for one repo unit. Completes the run and triggers
    /// scoring and vectorization exactly once.
    pub async fn on_unit_complete(
        &self,
        developer_id: &str,
        run_id: Uuid,
        repo: &str,
    ) -> Result<UnitOutcome, TaskError> {
        let _guard = self.locks.lock(developer_id).await;

        let Some(mut run) = self
            .store
            .get_ingestion_run(developer_id)
            .await
            .map_err(TaskError::Store)?
        else {
            return Ok(UnitOutcome::Ignored);
        };
        if run.run_id != run_id {
            debug!("late callback for {} from run {}", developer_id, run_id);
            return Ok(UnitOutcome::Ignored);
        }
        let Some(mut developer) = self
            .store
            .get_developer(developer_id)
            .await
            .map_err(TaskError::Store)?
        else {
            return Ok(UnitOutcome::Ignored);
        };
        if developer.status != IngestionStatus::InProgress {
            return Ok(UnitOutcome::Ignored);
        }
        if !run.record_completion(repo) {
            debug!("duplicate completion of {} for {}", repo, developer_id);
            return Ok(UnitOutcome::Ignored);
        }

        if !run.is_done() {
            self.store.put_ingestion_run(&run).await.map_err(TaskError::Store)?;
            return Ok(UnitOutcome::Recorded {
                completed: run.completed(),
                dispatched: run.dispatched,
            });
        }

        let now = Utc::now();
        developer.mark_complete(run.started_at, now);
        run.finished_at = Some(now);
        self.store.put_ingestion_run(&run).await.map_err(TaskError::Store)?;
        self.store.upsert_developer(&developer).await.map_err(TaskError::Store)?;
        for task in [
            Task::ComputeScores {
                developer_id: developer_id.to_owned(),
            },
            Task::BuildVectors {
                developer_id: developer_id.to_owned(),
            },
        ] {
            self.queue.enqueue(task).await.map_err(TaskError::Store)?;
        }
        info!("run {} for {} complete", run_id, developer_id);
        Ok(UnitOutcome::Completed)
    }
}
