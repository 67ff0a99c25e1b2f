use anyhow::Context as _;
use entity::{domain_score, repo_metadata, repo_portfolio};
use model::{DomainScore, RepoMetadata, RepoPortfolio};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Iterable,
    QueryFilter, QueryOrder, TransactionTrait,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct ProfileDatabase {
    pub connection: Arc<DatabaseConnection>,
}

impl ProfileDatabase {
    pub fn get_connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        ProfileDatabase { connection }
    }

    /// Writes every given domain row; domains absent from `scores` keep their
    /// previous row.
    pub async fn upsert_domain_scores(&self, scores: &[DomainScore]) -> anyhow::Result<()> {
        if scores.is_empty() {
            return Ok(());
        }
        let rows = scores
            .iter()
            .map(|s| domain_score::Model::from(s).into_active_model().reset_all());
        domain_score::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([domain_score::Column::DeveloperId, domain_score::Column::Domain])
                    .update_columns(domain_score::Column::iter().filter(|c| {
                        !matches!(c, domain_score::Column::DeveloperId | domain_score::Column::Domain)
                    }))
                    .to_owned(),
            )
            .exec_without_returning(self.get_connection())
            .await
            .context("upsert domain scores")?;
        Ok(())
    }

    pub async fn list_domain_scores(&self, developer_id: &str) -> anyhow::Result<Vec<DomainScore>> {
        let rows = domain_score::Entity::find()
            .filter(domain_score::Column::DeveloperId.eq(developer_id))
            .order_by_desc(domain_score::Column::Score)
            .order_by_asc(domain_score::Column::Domain)
            .all(self.get_connection())
            .await
            .with_context(|| format!("list domain scores for {}", developer_id))?;
        rows.into_iter()
            .map(|m| DomainScore::try_from(m).map_err(anyhow::Error::from))
            .collect()
    }

    pub async fn get_repo_metadata(&self, full_name: &str) -> anyhow::Result<Option<RepoMetadata>> {
        let row = repo_metadata::Entity::find_by_id(full_name.to_owned())
            .one(self.get_connection())
            .await
            .with_context(|| format!("load repo metadata {}", full_name))?;
        Ok(row.map(RepoMetadata::try_from).transpose()?)
    }

    /// Read-merge-write in one transaction so concurrent analyzers never
    /// regress a field another one already filled in.
    pub async fn merge_repo_metadata(&self, incoming: RepoMetadata) -> anyhow::Result<RepoMetadata> {
        let txn = self.get_connection().begin().await?;
        let existing = repo_metadata::Entity::find_by_id(incoming.full_name.clone())
            .one(&txn)
            .await?
            .map(RepoMetadata::try_from)
            .transpose()?;

        let merged = match existing {
            Some(current) => {
                let merged = current.merge(incoming);
                let active = repo_metadata::Model::from(&merged).into_active_model().reset_all();
                repo_metadata::Entity::update(active).exec(&txn).await?;
                merged
            }
            None => {
                let active = repo_metadata::Model::from(&incoming).into_active_model().reset_all();
                repo_metadata::Entity::insert(active).exec_without_returning(&txn).await?;
                incoming
            }
        };
        txn.commit()
            .await
            .with_context(|| format!("merge repo metadata {}", merged.full_name))?;
        Ok(merged)
    }

    pub async fn upsert_portfolios(&self, portfolios: &[RepoPortfolio]) -> anyhow::Result<()> {
        if portfolios.is_empty() {
            return Ok(());
        }
        let rows = portfolios
            .iter()
            .map(|p| repo_portfolio::Model::from(p).into_active_model().reset_all());
        repo_portfolio::Entity::insert_many(rows)
            .on_conflict(
                OnConflict::columns([repo_portfolio::Column::DeveloperId, repo_portfolio::Column::Repo])
                    .update_columns(repo_portfolio::Column::iter().filter(|c| {
                        !matches!(c, repo_portfolio::Column::DeveloperId | repo_portfolio::Column::Repo)
                    }))
                    .to_owned(),
            )
            .exec_without_returning(self.get_connection())
            .await
            .context("upsert repo portfolios")?;
        Ok(())
    }

    pub async fn list_portfolios(&self, developer_id: &str) -> anyhow::Result<Vec<RepoPortfolio>> {
        let rows = repo_portfolio::Entity::find()
            .filter(repo_portfolio::Column::DeveloperId.eq(developer_id))
            .order_by_desc(repo_portfolio::Column::TotalContributions)
            .order_by_asc(repo_portfolio::Column::Repo)
            .all(self.get_connection())
            .await
            .with_context(|| format!("list portfolios for {}", developer_id))?;
        rows.into_iter()
            .map(|m| RepoPortfolio::try_from(m).map_err(anyhow::Error::from))
            .collect()
    }
}
