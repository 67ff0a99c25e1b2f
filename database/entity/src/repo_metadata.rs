use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{from_json, to_json};
use model::RepoMetadata;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repo_metadata")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub full_name: String,
    pub description: Option<String>,
    pub primary_language: Option<String>,
    pub stars: i64,
    pub contributors: i64,
    pub has_tests: bool,
    pub topics_json: String,
    pub fork: bool,
    pub pushed_at: Option<ChronoDateTimeUtc>,
    pub cached_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RepoMetadata> for Model {
    fn from(r: &RepoMetadata) -> Self {
        Self {
            full_name: r.full_name.clone(),
            description: r.description.clone(),
            primary_language: r.primary_language.clone(),
            stars: r.stars,
            contributors: r.contributors,
            has_tests: r.has_tests,
            topics_json: to_json(&r.topics),
            fork: r.fork,
            pushed_at: r.pushed_at,
            cached_at: r.cached_at,
        }
    }
}

impl TryFrom<Model> for RepoMetadata {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(RepoMetadata {
            topics: from_json("topics_json", &m.topics_json)?,
            full_name: m.full_name,
            description: m.description,
            primary_language: m.primary_language,
            stars: m.stars,
            contributors: m.contributors,
            has_tests: m.has_tests,
            fork: m.fork,
            pushed_at: m.pushed_at,
            cached_at: m.cached_at,
        })
    }
}
