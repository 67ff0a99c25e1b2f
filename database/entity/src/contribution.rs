use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{from_json, to_json};
use model::{Contribution, ContributionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contributions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(indexed)]
    pub developer_id: String,
    pub repo: String,
    pub sha: String,
    pub message: String,
    pub authored_at: ChronoDateTimeUtc,
    pub additions: i64,
    pub deletions: i64,
    pub file_count: i32,
    pub churn: i64,
    pub entropy: f64,
    pub complexity_delta: i32,
    pub abs_complexity_delta: i32,
    pub test_ratio: f64,
    pub languages_json: String,
    pub file_paths_json: String,
    pub formatting_only: bool,
    pub contribution_type: Option<String>,
    pub domains_json: String,
    pub classified: bool,
    pub quality_score: Option<f64>,
    pub recency_weighted: Option<f64>,
    pub scored: bool,
    pub score_version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Contribution> for Model {
    fn from(c: &Contribution) -> Self {
        Self {
            id: c.id.clone(),
            developer_id: c.developer_id.clone(),
            repo: c.repo.clone(),
            sha: c.sha.clone(),
            message: c.message.clone(),
            authored_at: c.authored_at,
            additions: c.additions,
            deletions: c.deletions,
            file_count: c.file_count,
            churn: c.churn,
            entropy: c.entropy,
            complexity_delta: c.complexity_delta,
            abs_complexity_delta: c.abs_complexity_delta,
            test_ratio: c.test_ratio,
            languages_json: to_json(&c.languages),
            file_paths_json: to_json(&c.file_paths),
            formatting_only: c.formatting_only,
            contribution_type: c.contribution_type.map(|t| t.as_str().to_owned()),
            domains_json: to_json(&c.domains),
            classified: c.classified,
            quality_score: c.quality_score,
            recency_weighted: c.recency_weighted,
            scored: c.scored,
            score_version: c.score_version,
        }
    }
}

impl TryFrom<Model> for Contribution {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let contribution_type = match m.contribution_type.as_deref() {
            Some(raw) => Some(
                ContributionType::parse(raw)
                    .ok_or_else(|| DbErr::Type(format!("unknown contribution type {:?}", raw)))?,
            ),
            None => None,
        };
        Ok(Contribution {
            languages: from_json("languages_json", &m.languages_json)?,
            file_paths: from_json("file_paths_json", &m.file_paths_json)?,
            domains: from_json("domains_json", &m.domains_json)?,
            id: m.id,
            developer_id: m.developer_id,
            repo: m.repo,
            sha: m.sha,
            message: m.message,
            authored_at: m.authored_at,
            additions: m.additions,
            deletions: m.deletions,
            file_count: m.file_count,
            churn: m.churn,
            entropy: m.entropy,
            complexity_delta: m.complexity_delta,
            abs_complexity_delta: m.abs_complexity_delta,
            test_ratio: m.test_ratio,
            formatting_only: m.formatting_only,
            contribution_type,
            classified: m.classified,
            quality_score: m.quality_score,
            recency_weighted: m.recency_weighted,
            scored: m.scored,
            score_version: m.score_version,
        })
    }
}
