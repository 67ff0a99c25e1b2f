use std::sync::Arc;

use database::storage::RecordStore;
use evaluate::{score_to_grade, EvaluationGrade};
use model::{Developer, DomainScore, IngestionStatus, RepoPortfolio, Task};
use tracing::info;

use crate::queue::TaskQueue;

#[derive(Debug, Clone)]
pub struct ProfileView {
    pub developer: Developer,
    pub grade: EvaluationGrade,
    pub domain_scores: Vec<DomainScore>,
    pub portfolios: Vec<RepoPortfolio>,
}

#[derive(Debug, Clone)]
pub enum ProfileLookup {
    /// Not ready; ingestion was requested unless one is already running.
    Pending { status: IngestionStatus },
    OptedOut,
    Ready(Box<ProfileView>),
}

pub struct ProfileService {
    store: Arc<dyn RecordStore>,
    queue: Arc<dyn TaskQueue>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn RecordStore>, queue: Arc<dyn TaskQueue>) -> Self {
        Self { store, queue }
    }

    pub async fn lookup(&self, username: &str) -> anyhow::Result<ProfileLookup> {
        let id = Developer::normalize_id(username);
        let developer = self.store.get_developer(&id).await?;

        match developer {
            Some(d) if d.opted_out => Ok(ProfileLookup::OptedOut),
            Some(d) if d.status == IngestionStatus::Complete && d.has_scores() => {
                let mut domain_scores = self.store.list_domain_scores(&id).await?;
                domain_scores.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.domain.cmp(&b.domain))
                });
                let portfolios = self.store.list_portfolios(&id).await?;
                Ok(ProfileLookup::Ready(Box::new(ProfileView {
                    grade: score_to_grade(d.overall_score),
                    developer: d,
                    domain_scores,
                    portfolios,
                })))
            }
            other => {
                let status = other.as_ref().map_or(IngestionStatus::Pending, |d| d.status);
                if status != IngestionStatus::InProgress {
                    info!("profile {} not ready ({}), requesting ingestion", id, status.as_str());
                    self.queue
                        .enqueue(Task::Ingest {
                            username: username.trim().to_owned(),
                        })
                        .await?;
                }
                Ok(ProfileLookup::Pending { status })
            }
        }
    }
}
