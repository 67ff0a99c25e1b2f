use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{from_json, to_json};
use model::RepoPortfolio;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repo_portfolios")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub developer_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub repo: String,
    pub summary: String,
    pub stars: i64,
    pub contributors: i64,
    pub recent_contributions: i32,
    pub total_contributions: i32,
    pub languages_json: String,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RepoPortfolio> for Model {
    fn from(p: &RepoPortfolio) -> Self {
        Self {
            developer_id: p.developer_id.clone(),
            repo: p.repo.clone(),
            summary: p.summary.clone(),
            stars: p.stars,
            contributors: p.contributors,
            recent_contributions: p.recent_contributions,
            total_contributions: p.total_contributions,
            languages_json: to_json(&p.languages),
            updated_at: p.updated_at,
        }
    }
}

impl TryFrom<Model> for RepoPortfolio {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(RepoPortfolio {
            languages: from_json("languages_json", &m.languages_json)?,
            developer_id: m.developer_id,
            repo: m.repo,
            summary: m.summary,
            stars: m.stars,
            contributors: m.contributors,
            recent_contributions: m.recent_contributions,
            total_contributions: m.total_contributions,
            updated_at: m.updated_at,
        })
    }
}
