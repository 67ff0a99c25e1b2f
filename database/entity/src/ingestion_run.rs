use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{from_json, to_json};
use model::IngestionRun;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingestion_runs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub developer_id: String,
    pub run_id: Uuid,
    pub dispatched: i32,
    pub completed_units_json: String,
    pub started_at: ChronoDateTimeUtc,
    pub finished_at: Option<ChronoDateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&IngestionRun> for Model {
    fn from(r: &IngestionRun) -> Self {
        Self {
            developer_id: r.developer_id.clone(),
            run_id: r.run_id,
            dispatched: r.dispatched,
            completed_units_json: to_json(&r.completed_units),
            started_at: r.started_at,
            finished_at: r.finished_at,
        }
    }
}

impl TryFrom<Model> for IngestionRun {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(IngestionRun {
            completed_units: from_json("completed_units_json", &m.completed_units_json)?,
            developer_id: m.developer_id,
            run_id: m.run_id,
            dispatched: m.dispatched,
            started_at: m.started_at,
            finished_at: m.finished_at,
        })
    }
}
