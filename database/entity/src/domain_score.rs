use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{from_json, to_json};
use model::DomainScore;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "domain_scores")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub developer_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub domain: String,
    pub score: f64,
    pub contribution_count: i32,
    pub evidence_repos_json: String,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&DomainScore> for Model {
    fn from(d: &DomainScore) -> Self {
        Self {
            developer_id: d.developer_id.clone(),
            domain: d.domain.clone(),
            score: d.score,
            contribution_count: d.contribution_count,
            evidence_repos_json: to_json(&d.evidence_repos),
            updated_at: d.updated_at,
        }
    }
}

impl TryFrom<Model> for DomainScore {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(DomainScore {
            evidence_repos: from_json("evidence_repos_json", &m.evidence_repos_json)?,
            developer_id: m.developer_id,
            domain: m.domain,
            score: m.score,
            contribution_count: m.contribution_count,
            updated_at: m.updated_at,
        })
    }
}
