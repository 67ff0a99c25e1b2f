use anyhow::Context as _;
use entity::{contribution, review};
use model::{Contribution, Review};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct ContributionDatabase {
    pub connection: Arc<DatabaseConnection>,
}

impl ContributionDatabase {
    pub fn get_connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        ContributionDatabase { connection }
    }

    /// Upsert-or-ignore on the content id. Returns whether a row was written.
    pub async fn insert_contribution_if_absent(&self, record: &Contribution) -> anyhow::Result<bool> {
        let active = contribution::Model::from(record).into_active_model().reset_all();
        let written = contribution::Entity::insert(active)
            .on_conflict(
                OnConflict::column(contribution::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.get_connection())
            .await
            .with_context(|| format!("insert contribution {}@{}", record.repo, record.sha))?;
        Ok(written > 0)
    }

    pub async fn update_contribution(&self, record: &Contribution) -> anyhow::Result<()> {
        let active = contribution::Model::from(record).into_active_model().reset_all();
        contribution::Entity::update(active)
            .exec(self.get_connection())
            .await
            .with_context(|| format!("update contribution {}", record.id))?;
        Ok(())
    }

    pub async fn list_contributions(&self, developer_id: &str) -> anyhow::Result<Vec<Contribution>> {
        let rows = contribution::Entity::find()
            .filter(contribution::Column::DeveloperId.eq(developer_id))
            .order_by_asc(contribution::Column::AuthoredAt)
            .all(self.get_connection())
            .await
            .with_context(|| format!("list contributions for {}", developer_id))?;
        rows.into_iter()
            .map(|m| Contribution::try_from(m).map_err(anyhow::Error::from))
            .collect()
    }

    pub async fn list_unclassified(
        &self,
        developer_id: &str,
        limit: u64,
    ) -> anyhow::Result<Vec<Contribution>> {
        let rows = contribution::Entity::find()
            .filter(contribution::Column::DeveloperId.eq(developer_id))
            .filter(contribution::Column::Classified.eq(false))
            .order_by_asc(contribution::Column::AuthoredAt)
            .order_by_asc(contribution::Column::Id)
            .limit(limit)
            .all(self.get_connection())
            .await
            .with_context(|| format!("list unclassified contributions for {}", developer_id))?;
        rows.into_iter()
            .map(|m| Contribution::try_from(m).map_err(anyhow::Error::from))
            .collect()
    }

    pub async fn count_unclassified(&self, developer_id: &str) -> anyhow::Result<u64> {
        contribution::Entity::find()
            .filter(contribution::Column::DeveloperId.eq(developer_id))
            .filter(contribution::Column::Classified.eq(false))
            .count(self.get_connection())
            .await
            .with_context(|| format!("count unclassified contributions for {}", developer_id))
    }

    pub async fn count_contributions(&self, developer_id: &str) -> anyhow::Result<u64> {
        contribution::Entity::find()
            .filter(contribution::Column::DeveloperId.eq(developer_id))
            .count(self.get_connection())
            .await
            .with_context(|| format!("count contributions for {}", developer_id))
    }

    pub async fn insert_review_if_absent(&self, record: &Review) -> anyhow::Result<bool> {
        let active = review::Model::from(record).into_active_model().reset_all();
        let written = review::Entity::insert(active)
            .on_conflict(OnConflict::column(review::Column::Id).do_nothing().to_owned())
            .exec_without_returning(self.get_connection())
            .await
            .with_context(|| format!("insert review {}#{}", record.repo, record.pr_number))?;
        Ok(written > 0)
    }

    pub async fn list_reviews(&self, developer_id: &str) -> anyhow::Result<Vec<Review>> {
        let rows = review::Entity::find()
            .filter(review::Column::DeveloperId.eq(developer_id))
            .order_by_asc(review::Column::SubmittedAt)
            .all(self.get_connection())
            .await
            .with_context(|| format!("list reviews for {}", developer_id))?;
        rows.into_iter()
            .map(|m| Review::try_from(m).map_err(anyhow::Error::from))
            .collect()
    }
}
