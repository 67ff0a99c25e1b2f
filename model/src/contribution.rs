use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bumped whenever the formula changes; contributions scored under an older
/// version are picked up again by the next scoring pass.
pub const CURRENT_SCORE_VERSION: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionType {
    Feature,
    Bugfix,
    Security,
    Performance,
    Refactor,
    Test,
    Docs,
    Config,
    Chore,
    Dependency,
    Formatting,
    Generated,
    Other,
}

impl ContributionType {
    pub const ALL: [ContributionType; 13] = [
        ContributionType::Feature,
        ContributionType::Bugfix,
        ContributionType::Security,
        ContributionType::Performance,
        ContributionType::Refactor,
        ContributionType::Test,
        ContributionType::Docs,
        ContributionType::Config,
        ContributionType::Chore,
        ContributionType::Dependency,
        ContributionType::Formatting,
        ContributionType::Generated,
        ContributionType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionType::Feature => "feature",
            ContributionType::Bugfix => "bugfix",
            ContributionType::Security => "security",
            ContributionType::Performance => "performance",
            ContributionType::Refactor => "refactor",
            ContributionType::Test => "test",
            ContributionType::Docs => "docs",
            ContributionType::Config => "config",
            ContributionType::Chore => "chore",
            ContributionType::Dependency => "dependency",
            ContributionType::Formatting => "formatting",
            ContributionType::Generated => "generated",
            ContributionType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: String,
    pub developer_id: String,
    pub repo: String,
    pub sha: String,
    pub message: String,
    pub authored_at: DateTime<Utc>,

    pub additions: i64,
    pub deletions: i64,
    pub file_count: i32,

    pub churn: i64,
    pub entropy: f64,
    pub complexity_delta: i32,
    pub abs_complexity_delta: i32,
    pub test_ratio: f64,
    pub languages: Vec<String>,
    pub file_paths: Vec<String>,
    pub formatting_only: bool,

    pub contribution_type: Option<ContributionType>,
    pub domains: Vec<String>,
    pub classified: bool,

    pub quality_score: Option<f64>,
    pub recency_weighted: Option<f64>,
    pub scored: bool,
    pub score_version: i32,
}

impl Contribution {
    pub fn needs_scoring(&self) -> bool {
        self.classified && (!self.scored || self.score_version < CURRENT_SCORE_VERSION)
    }
}

/// Content-addressed contribution id: one row per (repo, commit) no matter how
/// many times the same commit is delivered.
pub fn contribution_id(repo: &str, sha: &str) -> String {
    crate::content_hash(&format!("{}:{}", repo.to_lowercase(), sha))
}
