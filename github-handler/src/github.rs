use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use model::github::{
    CommitDetail, CommitSummary, Contributor, GitHubErrorResponse, GitHubUser, PullRequest,
    PullReview, ReviewComment, UserRepo,
};
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::client::CodeHost;
use crate::error::{HostError, HostResult};
use crate::rate::{Fetched, RateLimit};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub user_agent: String,
    pub per_page: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_owned(),
            token: None,
            user_agent: "devrank".to_owned(),
            per_page: 100,
        }
    }
}

/// GitHub REST adapter for [`CodeHost`].
pub struct GitHubClient {
    http: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> HostResult<Fetched<T>> {
        let url = format!("{}/{}", self.config.api_url.trim_end_matches('/'), path);
        debug!("GET {}", url);

        let mut request = self
            .http
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, &self.config.user_agent);
        if let Some(token) = &self.config.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let resp = request.send().await?;
        let status = resp.status();
        let rate = parse_rate_limit(resp.headers());

        if status.is_success() {
            let data = resp
                .json::<T>()
                .await
                .map_err(|e| HostError::Schema(format!("{}: {}", path, e)))?;
            return Ok(Fetched::new(data, rate));
        }

        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok());
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GitHubErrorResponse>(&body)
            .map(|e| e.message)
            .unwrap_or(body);

        Err(classify_status(status, rate, retry_after, path, message))
    }

    fn per_page(&self) -> String {
        self.config.per_page.to_string()
    }
}

fn parse_rate_limit(headers: &HeaderMap) -> RateLimit {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
    };
    match (header("x-ratelimit-remaining"), header("x-ratelimit-reset")) {
        (Some(remaining), Some(reset)) => RateLimit {
            remaining: remaining.clamp(0, u32::MAX as i64) as u32,
            reset_at: Utc.timestamp_opt(reset, 0).single().unwrap_or_else(Utc::now),
        },
        _ => RateLimit::unknown(),
    }
}

fn classify_status(
    status: StatusCode,
    rate: RateLimit,
    retry_after: Option<i64>,
    path: &str,
    message: String,
) -> HostError {
    let throttled = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && (rate.remaining == 0 || retry_after.is_some()));
    if throttled {
        let reset_at: DateTime<Utc> = match retry_after {
            Some(secs) => Utc::now() + chrono::Duration::seconds(secs),
            None => rate.reset_at,
        };
        return HostError::RateLimited { reset_at };
    }
    if status == StatusCode::NOT_FOUND {
        return HostError::NotFound {
            resource: path.to_owned(),
        };
    }
    if status.is_server_error() {
        return HostError::Server {
            status: status.as_u16(),
            message,
        };
    }
    HostError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl CodeHost for GitHubClient {
    async fn get_user(&self, username: &str) -> HostResult<Fetched<GitHubUser>> {
        self.get_json(&format!("users/{}", username), &[]).await
    }

    async fn list_user_repos(&self, username: &str, page: u32) -> HostResult<Fetched<Vec<UserRepo>>> {
        self.get_json(
            &format!("users/{}/repos", username),
            &[
                ("type", "owner".to_owned()),
                ("sort", "pushed".to_owned()),
                ("per_page", self.per_page()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    async fn get_contributors(&self, repo: &str) -> HostResult<Fetched<Vec<Contributor>>> {
        self.get_json(
            &format!("repos/{}/contributors", repo),
            &[("per_page", self.per_page())],
        )
        .await
    }

    async fn list_commits(
        &self,
        repo: &str,
        author: &str,
        page: u32,
        since: Option<DateTime<Utc>>,
    ) -> HostResult<Fetched<Vec<CommitSummary>>> {
        let mut query = vec![
            ("author", author.to_owned()),
            ("per_page", self.per_page()),
            ("page", page.to_string()),
        ];
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339()));
        }
        self.get_json(&format!("repos/{}/commits", repo), &query).await
    }

    async fn get_commit_detail(&self, repo: &str, sha: &str) -> HostResult<Fetched<CommitDetail>> {
        self.get_json(&format!("repos/{}/commits/{}", repo, sha), &[])
            .await
    }

    async fn list_pull_requests(&self, repo: &str, page: u32) -> HostResult<Fetched<Vec<PullRequest>>> {
        self.get_json(
            &format!("repos/{}/pulls", repo),
            &[
                ("state", "all".to_owned()),
                ("per_page", self.per_page()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    async fn list_reviews(&self, repo: &str, pr: i64) -> HostResult<Fetched<Vec<PullReview>>> {
        self.get_json(
            &format!("repos/{}/pulls/{}/reviews", repo, pr),
            &[("per_page", self.per_page())],
        )
        .await
    }

    async fn list_review_comments(
        &self,
        repo: &str,
        pr: i64,
    ) -> HostResult<Fetched<Vec<ReviewComment>>> {
        self.get_json(
            &format!("repos/{}/pulls/{}/comments", repo, pr),
            &[("per_page", self.per_page())],
        )
        .await
    }
}
