use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{from_json, to_json};
use model::{Developer, DimensionScores, IngestionStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "developers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub username: String,
    pub github_id: Option<i64>,
    #[sea_orm(indexed)]
    pub status: String,
    pub last_ingested_at: Option<ChronoDateTimeUtc>,
    pub attempt_count: i32,
    pub failure_reason: Option<String>,
    pub code_quality: f64,
    pub review_quality: f64,
    pub documentation: f64,
    pub collaboration: f64,
    pub consistency: f64,
    pub impact: f64,
    pub overall_score: f64,
    pub score_version: Option<i32>,
    pub scored_at: Option<ChronoDateTimeUtc>,
    pub opted_out: bool,
    pub languages_json: String,
    pub top_domains_json: String,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Developer> for Model {
    fn from(d: &Developer) -> Self {
        Self {
            id: d.id.clone(),
            username: d.username.clone(),
            github_id: d.github_id,
            status: d.status.as_str().to_owned(),
            last_ingested_at: d.last_ingested_at,
            attempt_count: d.attempt_count,
            failure_reason: d.failure_reason.clone(),
            code_quality: d.scores.code_quality,
            review_quality: d.scores.review_quality,
            documentation: d.scores.documentation,
            collaboration: d.scores.collaboration,
            consistency: d.scores.consistency,
            impact: d.scores.impact,
            overall_score: d.overall_score,
            score_version: d.score_version,
            scored_at: d.scored_at,
            opted_out: d.opted_out,
            languages_json: to_json(&d.languages),
            top_domains_json: to_json(&d.top_domains),
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

impl TryFrom<Model> for Developer {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let status = IngestionStatus::parse(&m.status)
            .ok_or_else(|| DbErr::Type(format!("unknown ingestion status {:?}", m.status)))?;
        Ok(Developer {
            languages: from_json("languages_json", &m.languages_json)?,
            top_domains: from_json("top_domains_json", &m.top_domains_json)?,
            id: m.id,
            username: m.username,
            github_id: m.github_id,
            status,
            last_ingested_at: m.last_ingested_at,
            attempt_count: m.attempt_count,
            failure_reason: m.failure_reason,
            scores: DimensionScores {
                code_quality: m.code_quality,
                review_quality: m.review_quality,
                documentation: m.documentation,
                collaboration: m.collaboration,
                consistency: m.consistency,
                impact: m.impact,
            },
            overall_score: m.overall_score,
            score_version: m.score_version,
            scored_at: m.scored_at,
            opted_out: m.opted_out,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}
