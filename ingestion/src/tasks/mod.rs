//! Handlers for every pipeline stage. Each handler is idempotent: rows are
//! content-addressed, repo metadata is merge-upserted, and the coordinator
//! ignores repeat completions.

mod analyze_repo;
mod analyze_reviews;
mod build_vectors;
mod compute_scores;

pub use analyze_repo::build_contribution;
pub use analyze_reviews::build_review;

use std::sync::Arc;

use database::storage::RecordStore;
use evaluate::{Classifier, EvaluationContext, EvaluationManager, LabelModel};
use github_handler::{CodeHost, RateGate};
use model::{Developer, IngestionStatus, Task};
use uuid::Uuid;
use search::{Embedder, VectorIndex};

use crate::config::IngestionConfig;
use crate::coordinator::{Coordinator, StartOutcome};
use crate::error::{TaskError, TaskOutcome};
use crate::queue::TaskQueue;

/// External collaborators the pipeline runs against.
#[derive(Clone)]
pub struct Services {
    pub host: Arc<dyn CodeHost>,
    pub store: Arc<dyn RecordStore>,
    pub queue: Arc<dyn TaskQueue>,
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
    pub label_model: Option<Arc<dyn LabelModel>>,
}

pub struct Pipeline {
    host: Arc<dyn CodeHost>,
    gate: Arc<RateGate>,
    store: Arc<dyn RecordStore>,
    queue: Arc<dyn TaskQueue>,
    coordinator: Arc<Coordinator>,
    classifier: Classifier,
    evaluation: EvaluationManager,
    scoring: EvaluationContext,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    config: IngestionConfig,
}

impl Pipeline {
    pub fn new(
        services: Services,
        gate: Arc<RateGate>,
        scoring: EvaluationContext,
        config: IngestionConfig,
    ) -> Self {
        let coordinator = Arc::new(Coordinator::new(
            services.host.clone(),
            gate.clone(),
            services.store.clone(),
            services.queue.clone(),
            config.clone(),
        ));
        Self {
            host: services.host,
            gate,
            store: services.store,
            queue: services.queue,
            coordinator,
            classifier: Classifier::new(services.label_model),
            evaluation: EvaluationManager::default(),
            scoring,
            embedder: services.embedder,
            index: services.index,
            config,
        }
    }

    pub fn coordinator(&self) -> Arc<Coordinator> {
        self.coordinator.clone()
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    pub async fn handle(&self, task: &Task) -> Result<TaskOutcome, TaskError> {
        match task {
            Task::Ingest { username } => match self.coordinator.start(username).await? {
                StartOutcome::AlreadyRunning => Ok(TaskOutcome::Skipped("run already in flight".into())),
                StartOutcome::OptedOut => Ok(TaskOutcome::Skipped("developer opted out".into())),
                _ => Ok(TaskOutcome::Done),
            },
            Task::AnalyzeRepo {
                developer_id,
                run_id,
                repo,
            } => self.analyze_repo(developer_id, *run_id, repo).await,
            Task::AnalyzeReviews {
                developer_id,
                run_id,
                repo,
            } => self.analyze_reviews(developer_id, *run_id, repo).await,
            Task::ComputeScores { developer_id } => self.compute_scores(developer_id).await,
            Task::BuildVectors { developer_id } => self.build_vectors(developer_id).await,
        }
    }

    /// The developer, if `run_id` is still their live run. Otherwise the
    /// outcome the unit should finish with, before any upstream call.
    async fn live_run(
        &self,
        developer_id: &str,
        run_id: Uuid,
    ) -> Result<Result<Developer, TaskOutcome>, TaskError> {
        let Some(developer) = self
            .store
            .get_developer(developer_id)
            .await
            .map_err(TaskError::Store)?
        else {
            return Ok(Err(TaskOutcome::Skipped("developer vanished".into())));
        };
        if developer.opted_out || developer.status != IngestionStatus::InProgress {
            return Ok(Err(TaskOutcome::Skipped("run no longer in progress".into())));
        }
        let current = self
            .store
            .get_ingestion_run(developer_id)
            .await
            .map_err(TaskError::Store)?;
        if current.map(|r| r.run_id) != Some(run_id) {
            return Ok(Err(TaskOutcome::Skipped("stale run".into())));
        }
        Ok(Ok(developer))
    }
}
