use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{
    Contribution, Developer, DomainScore, IngestionRun, IngestionStatus, QualificationFilter,
    RepoMetadata, RepoPortfolio, Review,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use super::RecordStore;

#[derive(Default)]
struct Tables {
    developers: BTreeMap<String, Developer>,
    runs: HashMap<String, IngestionRun>,
    contributions: BTreeMap<String, Contribution>,
    reviews: BTreeMap<String, Review>,
    domain_scores: BTreeMap<(String, String), DomainScore>,
    repo_metadata: HashMap<String, RepoMetadata>,
    portfolios: BTreeMap<(String, String), RepoPortfolio>,
}

/// Process-local store with the same semantics as the database one.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ranked(&self, filter: &QualificationFilter, now: DateTime<Utc>) -> Vec<Developer> {
        let tables = self.tables.read();
        let mut found: Vec<Developer> = tables
            .developers
            .values()
            .filter(|d| filter.admits(d, now))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.overall_score
                .partial_cmp(&a.overall_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        found
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_developer(&self, id: &str) -> anyhow::Result<Option<Developer>> {
        Ok(self.tables.read().developers.get(id).cloned())
    }

    async fn upsert_developer(&self, developer: &Developer) -> anyhow::Result<()> {
        self.tables
            .write()
            .developers
            .insert(developer.id.clone(), developer.clone());
        Ok(())
    }

    async fn list_developers_by_status(&self, status: IngestionStatus) -> anyhow::Result<Vec<Developer>> {
        Ok(self
            .tables
            .read()
            .developers
            .values()
            .filter(|d| d.status == status)
            .cloned()
            .collect())
    }

    async fn purge_developer_data(&self, developer_id: &str) -> anyhow::Result<()> {
        let mut tables = self.tables.write();
        tables.contributions.retain(|_, c| c.developer_id != developer_id);
        tables.reviews.retain(|_, r| r.developer_id != developer_id);
        tables.domain_scores.retain(|(dev, _), _| dev != developer_id);
        tables.portfolios.retain(|(dev, _), _| dev != developer_id);
        tables.runs.remove(developer_id);
        Ok(())
    }

    async fn get_ingestion_run(&self, developer_id: &str) -> anyhow::Result<Option<IngestionRun>> {
        Ok(self.tables.read().runs.get(developer_id).cloned())
    }

    async fn put_ingestion_run(&self, run: &IngestionRun) -> anyhow::Result<()> {
        self.tables
            .write()
            .runs
            .insert(run.developer_id.clone(), run.clone());
        Ok(())
    }

    async fn insert_contribution_if_absent(&self, contribution: &Contribution) -> anyhow::Result<bool> {
        let mut tables = self.tables.write();
        if tables.contributions.contains_key(&contribution.id) {
            return Ok(false);
        }
        tables
            .contributions
            .insert(contribution.id.clone(), contribution.clone());
        Ok(true)
    }

    async fn update_contribution(&self, contribution: &Contribution) -> anyhow::Result<()> {
        let mut tables = self.tables.write();
        match tables.contributions.get_mut(&contribution.id) {
            Some(slot) => {
                *slot = contribution.clone();
                Ok(())
            }
            None => anyhow::bail!("contribution {} does not exist", contribution.id),
        }
    }

    async fn list_contributions(&self, developer_id: &str) -> anyhow::Result<Vec<Contribution>> {
        let mut found: Vec<Contribution> = self
            .tables
            .read()
            .contributions
            .values()
            .filter(|c| c.developer_id == developer_id)
            .cloned()
            .collect();
        found.sort_by_key(|c| c.authored_at);
        Ok(found)
    }

    async fn list_unclassified(&self, developer_id: &str, limit: u64) -> anyhow::Result<Vec<Contribution>> {
        let mut found: Vec<Contribution> = self
            .tables
            .read()
            .contributions
            .values()
            .filter(|c| c.developer_id == developer_id && !c.classified)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.authored_at.cmp(&b.authored_at).then(a.id.cmp(&b.id)));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn count_unclassified(&self, developer_id: &str) -> anyhow::Result<u64> {
        Ok(self
            .tables
            .read()
            .contributions
            .values()
            .filter(|c| c.developer_id == developer_id && !c.classified)
            .count() as u64)
    }

    async fn count_contributions(&self, developer_id: &str) -> anyhow::Result<u64> {
        Ok(self
            .tables
            .read()
            .contributions
            .values()
            .filter(|c| c.developer_id == developer_id)
            .count() as u64)
    }

    async fn insert_review_if_absent(&self, review: &Review) -> anyhow::Result<bool> {
        let mut tables = self.tables.write();
        if tables.reviews.contains_key(&review.id) {
            return Ok(false);
        }
        tables.reviews.insert(review.id.clone(), review.clone());
        Ok(true)
    }

    async fn list_reviews(&self, developer_id: &str) -> anyhow::Result<Vec<Review>> {
        let mut found: Vec<Review> = self
            .tables
            .read()
            .reviews
            .values()
            .filter(|r| r.developer_id == developer_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.submitted_at);
        Ok(found)
    }

    async fn upsert_domain_scores(&self, scores: &[DomainScore]) -> anyhow::Result<()> {
        let mut tables = self.tables.write();
        for score in scores {
            tables
                .domain_scores
                .insert((score.developer_id.clone(), score.domain.clone()), score.clone());
        }
        Ok(())
    }

    async fn list_domain_scores(&self, developer_id: &str) -> anyhow::Result<Vec<DomainScore>> {
        let mut found: Vec<DomainScore> = self
            .tables
            .read()
            .domain_scores
            .values()
            .filter(|d| d.developer_id == developer_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.domain.cmp(&b.domain))
        });
        Ok(found)
    }

    async fn get_repo_metadata(&self, full_name: &str) -> anyhow::Result<Option<RepoMetadata>> {
        Ok(self.tables.read().repo_metadata.get(full_name).cloned())
    }

    async fn merge_repo_metadata(&self, incoming: RepoMetadata) -> anyhow::Result<RepoMetadata> {
        let mut tables = self.tables.write();
        let merged = match tables.repo_metadata.remove(&incoming.full_name) {
            Some(current) => current.merge(incoming),
            None => incoming,
        };
        tables
            .repo_metadata
            .insert(merged.full_name.clone(), merged.clone());
        Ok(merged)
    }

    async fn upsert_portfolios(&self, portfolios: &[RepoPortfolio]) -> anyhow::Result<()> {
        let mut tables = self.tables.write();
        for p in portfolios {
            tables
                .portfolios
                .insert((p.developer_id.clone(), p.repo.clone()), p.clone());
        }
        Ok(())
    }

    async fn list_portfolios(&self, developer_id: &str) -> anyhow::Result<Vec<RepoPortfolio>> {
        let mut found: Vec<RepoPortfolio> = self
            .tables
            .read()
            .portfolios
            .values()
            .filter(|p| p.developer_id == developer_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.total_contributions
                .cmp(&a.total_contributions)
                .then(a.repo.cmp(&b.repo))
        });
        Ok(found)
    }

    async fn qualified_developers(
        &self,
        ids: &[String],
        filter: &QualificationFilter,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Developer>> {
        Ok(self
            .ranked(filter, now)
            .into_iter()
            .filter(|d| ids.contains(&d.id))
            .collect())
    }

    async fn top_developers(
        &self,
        filter: &QualificationFilter,
        limit: usize,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Developer>> {
        let mut found = self.ranked(filter, now);
        found.truncate(limit);
        Ok(found)
    }
}
