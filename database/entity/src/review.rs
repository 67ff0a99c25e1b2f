use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use model::{Review, ReviewState};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(indexed)]
    pub developer_id: String,
    pub repo: String,
    pub pr_number: i64,
    pub pr_author: Option<String>,
    pub pr_opened_at: Option<ChronoDateTimeUtc>,
    pub state: String,
    pub comment_count: i32,
    pub comment_chars: i64,
    pub references_code: bool,
    pub submitted_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Review> for Model {
    fn from(r: &Review) -> Self {
        Self {
            id: r.id.clone(),
            developer_id: r.developer_id.clone(),
            repo: r.repo.clone(),
            pr_number: r.pr_number,
            pr_author: r.pr_author.clone(),
            pr_opened_at: r.pr_opened_at,
            state: r.state.as_str().to_owned(),
            comment_count: r.comment_count,
            comment_chars: r.comment_chars,
            references_code: r.references_code,
            submitted_at: r.submitted_at,
        }
    }
}

impl TryFrom<Model> for Review {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let state = ReviewState::parse(&m.state)
            .ok_or_else(|| DbErr::Type(format!("unknown review state {:?}", m.state)))?;
        Ok(Review {
            id: m.id,
            developer_id: m.developer_id,
            repo: m.repo,
            pr_number: m.pr_number,
            pr_author: m.pr_author,
            pr_opened_at: m.pr_opened_at,
            state,
            comment_count: m.comment_count,
            comment_chars: m.comment_chars,
            references_code: m.references_code,
            submitted_at: m.submitted_at,
        })
    }
}
