pub mod contribution;
pub mod developer;
pub mod domain_score;
pub mod ingestion_run;
pub mod repo_metadata;
pub mod repo_portfolio;
pub mod review;

use sea_orm::DbErr;
use serde::de::DeserializeOwned;
use serde::Serialize;

// 复杂结构序列化为json字符串
pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_owned())
}

pub(crate) fn from_json<T: DeserializeOwned>(column: &str, raw: &str) -> Result<T, DbErr> {
    serde_json::from_str(raw).map_err(|e| DbErr::Json(format!("{}: {}", column, e)))
}
