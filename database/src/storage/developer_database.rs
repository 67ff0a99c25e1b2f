use anyhow::Context as _;
use chrono::{DateTime, Utc};
use entity::{developer, ingestion_run};
use futures::{Stream, TryStreamExt};
use model::{Developer, IngestionRun, IngestionStatus, QualificationFilter};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    Iterable, QueryFilter, QueryOrder,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct DeveloperDatabase {
    pub connection: Arc<DatabaseConnection>,
}

impl DeveloperDatabase {
    /// 获取底层连接
    pub fn get_connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        DeveloperDatabase { connection }
    }

    pub async fn get_developer(&self, id: &str) -> anyhow::Result<Option<Developer>> {
        let row = developer::Entity::find_by_id(id.to_owned())
            .one(self.get_connection())
            .await
            .with_context(|| format!("load developer {}", id))?;
        Ok(row.map(Developer::try_from).transpose()?)
    }

    pub async fn upsert_developer(&self, record: &Developer) -> anyhow::Result<()> {
        let active = developer::Model::from(record).into_active_model().reset_all();
        developer::Entity::insert(active)
            .on_conflict(
                OnConflict::column(developer::Column::Id)
                    .update_columns(
                        developer::Column::iter().filter(|c| !matches!(c, developer::Column::Id)),
                    )
                    .to_owned(),
            )
            .exec_without_returning(self.get_connection())
            .await
            .with_context(|| format!("upsert developer {}", record.id))?;
        Ok(())
    }

    /// 按状态获取开发者的查询流
    pub async fn developers_stream(
        &self,
        status: IngestionStatus,
    ) -> Result<impl Stream<Item = Result<developer::Model, DbErr>> + Send + '_, DbErr> {
        developer::Entity::find()
            .filter(developer::Column::Status.eq(status.as_str()))
            .order_by_asc(developer::Column::Id)
            .stream(self.get_connection())
            .await
    }

    pub async fn list_developers_by_status(
        &self,
        status: IngestionStatus,
    ) -> anyhow::Result<Vec<Developer>> {
        let rows: Vec<developer::Model> = self.developers_stream(status).await?.try_collect().await?;
        rows.into_iter()
            .map(|m| Developer::try_from(m).map_err(anyhow::Error::from))
            .collect()
    }

    /// Complete, non-opted-out developers with a positive overall score,
    /// best first. The optional filter bounds are applied afterwards.
    async fn ranked_candidates(&self, ids: Option<&[String]>) -> anyhow::Result<Vec<Developer>> {
        let mut query = developer::Entity::find()
            .filter(developer::Column::Status.eq(IngestionStatus::Complete.as_str()))
            .filter(developer::Column::OptedOut.eq(false))
            .filter(developer::Column::OverallScore.gt(0.0));
        if let Some(ids) = ids {
            query = query.filter(developer::Column::Id.is_in(ids.iter().cloned()));
        }
        let rows = query
            .order_by_desc(developer::Column::OverallScore)
            .order_by_asc(developer::Column::Id)
            .all(self.get_connection())
            .await
            .context("query qualified developers")?;
        rows.into_iter()
            .map(|m| Developer::try_from(m).map_err(anyhow::Error::from))
            .collect()
    }

    pub async fn qualified_developers(
        &self,
        ids: &[String],
        filter: &QualificationFilter,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Developer>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut found = self.ranked_candidates(Some(ids)).await?;
        found.retain(|d| filter.admits(d, now));
        Ok(found)
    }

    pub async fn top_developers(
        &self,
        filter: &QualificationFilter,
        limit: usize,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Developer>> {
        let found = self.ranked_candidates(None).await?;
        Ok(found
            .into_iter()
            .filter(|d| filter.admits(d, now))
            .take(limit)
            .collect())
    }

    pub async fn get_ingestion_run(&self, developer_id: &str) -> anyhow::Result<Option<IngestionRun>> {
        let row = ingestion_run::Entity::find_by_id(developer_id.to_owned())
            .one(self.get_connection())
            .await
            .with_context(|| format!("load ingestion run for {}", developer_id))?;
        Ok(row.map(IngestionRun::try_from).transpose()?)
    }

    pub async fn put_ingestion_run(&self, run: &IngestionRun) -> anyhow::Result<()> {
        let active = ingestion_run::Model::from(run).into_active_model().reset_all();
        ingestion_run::Entity::insert(active)
            .on_conflict(
                OnConflict::column(ingestion_run::Column::DeveloperId)
                    .update_columns(
                        ingestion_run::Column::iter()
                            .filter(|c| !matches!(c, ingestion_run::Column::DeveloperId)),
                    )
                    .to_owned(),
            )
            .exec_without_returning(self.get_connection())
            .await
            .with_context(|| format!("store ingestion run for {}", run.developer_id))?;
        Ok(())
    }
}
