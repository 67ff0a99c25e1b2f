use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// GitHub用户信息结构
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GitHubUser {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub public_repos: Option<i32>,
    pub followers: Option<i32>,
    #[serde(rename = "type", default)]
    pub user_type: String,
}

impl GitHubUser {
    pub fn is_bot(&self) -> bool {
        self.user_type == "Bot"
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RepoOwner {
    pub login: String,
}

/// Entry of `GET /users/{user}/repos`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserRepo {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub owner: RepoOwner,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub topics: Vec<String>,
    pub pushed_at: Option<DateTime<Utc>>,
}

// 贡献者信息结构
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Contributor {
    pub id: i64,
    pub login: String,
    pub contributions: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommitSignature {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommitInfo {
    pub author: Option<CommitSignature>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ParentRef {
    pub sha: String,
}

/// Entry of `GET /repos/{repo}/commits`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommitSummary {
    pub sha: String,
    pub commit: CommitInfo,
    #[serde(default)]
    pub parents: Vec<ParentRef>,
}

impl CommitSummary {
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CommitStats {
    #[serde(default)]
    pub additions: i64,
    #[serde(default)]
    pub deletions: i64,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommitFile {
    pub filename: String,
    #[serde(default)]
    pub additions: i64,
    #[serde(default)]
    pub deletions: i64,
    #[serde(default)]
    pub status: String,
    /// Absent for binary or oversized diffs.
    pub patch: Option<String>,
}

impl CommitFile {
    pub fn churn(&self) -> i64 {
        self.additions + self.deletions
    }
}

/// `GET /repos/{repo}/commits/{sha}`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommitDetail {
    pub sha: String,
    pub commit: CommitInfo,
    #[serde(default)]
    pub stats: CommitStats,
    #[serde(default)]
    pub files: Vec<CommitFile>,
    #[serde(default)]
    pub parents: Vec<ParentRef>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserRef {
    pub login: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PullRequest {
    pub number: i64,
    pub user: Option<UserRef>,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

/// Entry of `GET /repos/{repo}/pulls/{n}/reviews`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PullReview {
    pub id: i64,
    pub user: Option<UserRef>,
    pub state: String,
    #[serde(default)]
    pub body: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Entry of `GET /repos/{repo}/pulls/{n}/comments`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReviewComment {
    pub id: i64,
    pub pull_request_review_id: Option<i64>,
    pub user: Option<UserRef>,
    #[serde(default)]
    pub body: String,
    pub path: Option<String>,
    pub line: Option<i64>,
    pub original_line: Option<i64>,
}

impl ReviewComment {
    pub fn references_code(&self) -> bool {
        self.path.is_some() && (self.line.is_some() || self.original_line.is_some())
    }
}

#[derive(Debug, Deserialize)]
pub struct GitHubErrorResponse {
    #[serde(default)]
    pub message: String,
    pub documentation_url: Option<String>,
}
