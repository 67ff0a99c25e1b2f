use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
}

impl ReviewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewState::Approved => "approved",
            ReviewState::ChangesRequested => "changes_requested",
            ReviewState::Commented => "commented",
            ReviewState::Dismissed => "dismissed",
            ReviewState::Pending => "pending",
        }
    }

    /// Accepts both the stored snake_case form and GitHub's `CHANGES_REQUESTED` form.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "approved" => Some(ReviewState::Approved),
            "changes_requested" => Some(ReviewState::ChangesRequested),
            "commented" => Some(ReviewState::Commented),
            "dismissed" => Some(ReviewState::Dismissed),
            "pending" => Some(ReviewState::Pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub developer_id: String,
    pub repo: String,
    pub pr_number: i64,
    pub pr_author: Option<String>,
    pub pr_opened_at: Option<DateTime<Utc>>,
    pub state: ReviewState,
    pub comment_count: i32,
    pub comment_chars: i64,
    pub references_code: bool,
    pub submitted_at: DateTime<Utc>,
}

pub fn review_id(repo: &str, pr_number: i64, upstream_id: i64) -> String {
    crate::content_hash(&format!("{}:{}:{}", repo.to_lowercase(), pr_number, upstream_id))
}
