pub mod contribution_database;
pub mod developer_database;
pub mod memory;
pub mod profile_database;

use anyhow::Context as _;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contribution_database::ContributionDatabase;
use developer_database::DeveloperDatabase;
use entity::{
    contribution, developer, domain_score, ingestion_run, repo_metadata, repo_portfolio, review,
};
use model::{
    Contribution, Developer, DomainScore, IngestionRun, IngestionStatus, QualificationFilter,
    RepoMetadata, RepoPortfolio, Review,
};
use profile_database::ProfileDatabase;
use sea_orm::{
    ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Schema,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::info;

pub use memory::MemoryStore;

/// Keyed CRUD and filtered queries over every persisted record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_developer(&self, id: &str) -> anyhow::Result<Option<Developer>>;
    async fn upsert_developer(&self, developer: &Developer) -> anyhow::Result<()>;
    async fn list_developers_by_status(&self, status: IngestionStatus) -> anyhow::Result<Vec<Developer>>;
    /// Drops every row that hangs off a developer; the developer row stays.
    async fn purge_developer_data(&self, developer_id: &str) -> anyhow::Result<()>;

    async fn get_ingestion_run(&self, developer_id: &str) -> anyhow::Result<Option<IngestionRun>>;
    async fn put_ingestion_run(&self, run: &IngestionRun) -> anyhow::Result<()>;

    /// Returns false when a contribution with the same id already exists.
    async fn insert_contribution_if_absent(&self, contribution: &Contribution) -> anyhow::Result<bool>;
    async fn update_contribution(&self, contribution: &Contribution) -> anyhow::Result<()>;
    async fn list_contributions(&self, developer_id: &str) -> anyhow::Result<Vec<Contribution>>;
    async fn list_unclassified(&self, developer_id: &str, limit: u64) -> anyhow::Result<Vec<Contribution>>;
    async fn count_unclassified(&self, developer_id: &str) -> anyhow::Result<u64>;
    async fn count_contributions(&self, developer_id: &str) -> anyhow::Result<u64>;

    async fn insert_review_if_absent(&self, review: &Review) -> anyhow::Result<bool>;
    async fn list_reviews(&self, developer_id: &str) -> anyhow::Result<Vec<Review>>;

    async fn upsert_domain_scores(&self, scores: &[DomainScore]) -> anyhow::Result<()>;
    async fn list_domain_scores(&self, developer_id: &str) -> anyhow::Result<Vec<DomainScore>>;

    async fn get_repo_metadata(&self, full_name: &str) -> anyhow::Result<Option<RepoMetadata>>;
    /// Never-regress merge; returns the stored result.
    async fn merge_repo_metadata(&self, incoming: RepoMetadata) -> anyhow::Result<RepoMetadata>;

    async fn upsert_portfolios(&self, portfolios: &[RepoPortfolio]) -> anyhow::Result<()>;
    async fn list_portfolios(&self, developer_id: &str) -> anyhow::Result<Vec<RepoPortfolio>>;

    /// The subset of `ids` passing the qualification gate, best overall score first.
    async fn qualified_developers(
        &self,
        ids: &[String],
        filter: &QualificationFilter,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Developer>>;
    async fn top_developers(
        &self,
        filter: &QualificationFilter,
        limit: usize,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Developer>>;
}

#[derive(Clone)]
pub struct Context {
    pub connection: Arc<DatabaseConnection>,
}

impl Context {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        let connection = Database::connect(db_url)
            .await
            .with_context(|| format!("connect to {}", db_url))?;
        Ok(Self::from_connection(connection))
    }

    pub fn from_connection(connection: DatabaseConnection) -> Self {
        Context {
            connection: Arc::new(connection),
        }
    }

    pub fn developer_stg(&self) -> DeveloperDatabase {
        DeveloperDatabase::new(self.connection.clone())
    }

    pub fn contribution_stg(&self) -> ContributionDatabase {
        ContributionDatabase::new(self.connection.clone())
    }

    pub fn profile_stg(&self) -> ProfileDatabase {
        ProfileDatabase::new(self.connection.clone())
    }

    /// Creates any missing table from the entity definitions.
    pub async fn setup_schema(&self) -> anyhow::Result<()> {
        let backend = self.connection.get_database_backend();
        let schema = Schema::new(backend);
        let statements = [
            schema.create_table_from_entity(developer::Entity).if_not_exists().to_owned(),
            schema.create_table_from_entity(ingestion_run::Entity).if_not_exists().to_owned(),
            schema.create_table_from_entity(contribution::Entity).if_not_exists().to_owned(),
            schema.create_table_from_entity(review::Entity).if_not_exists().to_owned(),
            schema.create_table_from_entity(domain_score::Entity).if_not_exists().to_owned(),
            schema.create_table_from_entity(repo_metadata::Entity).if_not_exists().to_owned(),
            schema.create_table_from_entity(repo_portfolio::Entity).if_not_exists().to_owned(),
        ];
        for stmt in statements {
            self.connection
                .execute(backend.build(&stmt))
                .await
                .context("create table")?;
        }
        info!("database schema ready");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for Context {
    async fn get_developer(&self, id: &str) -> anyhow::Result<Option<Developer>> {
        self.developer_stg().get_developer(id).await
    }

    async fn upsert_developer(&self, developer: &Developer) -> anyhow::Result<()> {
        self.developer_stg().upsert_developer(developer).await
    }

    async fn list_developers_by_status(&self, status: IngestionStatus) -> anyhow::Result<Vec<Developer>> {
        self.developer_stg().list_developers_by_status(status).await
    }

    async fn purge_developer_data(&self, developer_id: &str) -> anyhow::Result<()> {
        let txn = self.connection.begin().await?;
        contribution::Entity::delete_many()
            .filter(contribution::Column::DeveloperId.eq(developer_id))
            .exec(&txn)
            .await?;
        review::Entity::delete_many()
            .filter(review::Column::DeveloperId.eq(developer_id))
            .exec(&txn)
            .await?;
        domain_score::Entity::delete_many()
            .filter(domain_score::Column::DeveloperId.eq(developer_id))
            .exec(&txn)
            .await?;
        repo_portfolio::Entity::delete_many()
            .filter(repo_portfolio::Column::DeveloperId.eq(developer_id))
            .exec(&txn)
            .await?;
        ingestion_run::Entity::delete_many()
            .filter(ingestion_run::Column::DeveloperId.eq(developer_id))
            .exec(&txn)
            .await?;
        txn.commit()
            .await
            .with_context(|| format!("purge data for {}", developer_id))
    }

    async fn get_ingestion_run(&self, developer_id: &str) -> anyhow::Result<Option<IngestionRun>> {
        self.developer_stg().get_ingestion_run(developer_id).await
    }

    async fn put_ingestion_run(&self, run: &IngestionRun) -> anyhow::Result<()> {
        self.developer_stg().put_ingestion_run(run).await
    }

    async fn insert_contribution_if_absent(&self, contribution: &Contribution) -> anyhow::Result<bool> {
        self.contribution_stg().insert_contribution_if_absent(contribution).await
    }

    async fn update_contribution(&self, contribution: &Contribution) -> anyhow::Result<()> {
        self.contribution_stg().update_contribution(contribution).await
    }

    async fn list_contributions(&self, developer_id: &str) -> anyhow::Result<Vec<Contribution>> {
        self.contribution_stg().list_contributions(developer_id).await
    }

    async fn list_unclassified(&self, developer_id: &str, limit: u64) -> anyhow::Result<Vec<Contribution>> {
        self.contribution_stg().list_unclassified(developer_id, limit).await
    }

    async fn count_unclassified(&self, developer_id: &str) -> anyhow::Result<u64> {
        self.contribution_stg().count_unclassified(developer_id).await
    }

    async fn count_contributions(&self, developer_id: &str) -> anyhow::Result<u64> {
        self.contribution_stg().count_contributions(developer_id).await
    }

    async fn insert_review_if_absent(&self, review: &Review) -> anyhow::Result<bool> {
        self.contribution_stg().insert_review_if_absent(review).await
    }

    async fn list_reviews(&self, developer_id: &str) -> anyhow::Result<Vec<Review>> {
        self.contribution_stg().list_reviews(developer_id).await
    }

    async fn upsert_domain_scores(&self, scores: &[DomainScore]) -> anyhow::Result<()> {
        self.profile_stg().upsert_domain_scores(scores).await
    }

    async fn list_domain_scores(&self, developer_id: &str) -> anyhow::Result<Vec<DomainScore>> {
        self.profile_stg().list_domain_scores(developer_id).await
    }

    async fn get_repo_metadata(&self, full_name: &str) -> anyhow::Result<Option<RepoMetadata>> {
        self.profile_stg().get_repo_metadata(full_name).await
    }

    async fn merge_repo_metadata(&self, incoming: RepoMetadata) -> anyhow::Result<RepoMetadata> {
        self.profile_stg().merge_repo_metadata(incoming).await
    }

    async fn upsert_portfolios(&self, portfolios: &[RepoPortfolio]) -> anyhow::Result<()> {
        self.profile_stg().upsert_portfolios(portfolios).await
    }

    async fn list_portfolios(&self, developer_id: &str) -> anyhow::Result<Vec<RepoPortfolio>> {
        self.profile_stg().list_portfolios(developer_id).await
    }

    async fn qualified_developers(
        &self,
        ids: &[String],
        filter: &QualificationFilter,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Developer>> {
        self.developer_stg().qualified_developers(ids, filter, now).await
    }

    async fn top_developers(
        &self,
        filter: &QualificationFilter,
        limit: usize,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Developer>> {
        self.developer_stg().top_developers(filter, limit, now).await
    }
}
