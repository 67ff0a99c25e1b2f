use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::github::{
    CommitDetail, CommitSummary, Contributor, GitHubUser, PullRequest, PullReview, ReviewComment,
    UserRepo,
};

use crate::error::HostResult;
use crate::rate::Fetched;

/// Async capability over the upstream code-hosting API. Every call reports the
/// remaining rate-limit budget next to its payload.
#[async_trait]
pub trait CodeHost: Send + Sync {
    async fn get_user(&self, username: &str) -> HostResult<Fetched<GitHubUser>>;

    async fn list_user_repos(&self, username: &str, page: u32) -> HostResult<Fetched<Vec<UserRepo>>>;

    async fn get_contributors(&self, repo: &str) -> HostResult<Fetched<Vec<Contributor>>>;

    async fn list_commits(
        &self,
        repo: &str,
        author: &str,
        page: u32,
        since: Option<DateTime<Utc>>,
    ) -> HostResult<Fetched<Vec<CommitSummary>>>;

    async fn get_commit_detail(&self, repo: &str, sha: &str) -> HostResult<Fetched<CommitDetail>>;

    async fn list_pull_requests(&self, repo: &str, page: u32) -> HostResult<Fetched<Vec<PullRequest>>>;

    async fn list_reviews(&self, repo: &str, pr: i64) -> HostResult<Fetched<Vec<PullReview>>>;

    async fn list_review_comments(
        &self,
        repo: &str,
        pr: i64,
    ) -> HostResult<Fetched<Vec<ReviewComment>>>;
}
