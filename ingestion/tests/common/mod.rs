#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::storage::MemoryStore;
use evaluate::EvaluationContext;
use github_handler::{CodeHost, Fetched, HostError, HostResult, RateGate, RateLimit};
use ingestion::tasks::Services;
use ingestion::{IngestionConfig, LocalQueue, Pipeline, TaskQueue, Worker};
use model::github::{
    CommitDetail, CommitFile, CommitInfo, CommitSignature, CommitStats, CommitSummary,
    Contributor, GitHubUser, PullRequest, PullReview, RepoOwner, ReviewComment, UserRef, UserRepo,
};
use model::Task;
use parking_lot::Mutex;
use search::{Embedder, MemoryVectorIndex};

fn fetched<T>(data: T) -> HostResult<Fetched<T>> {
    Ok(Fetched::new(data, RateLimit::unknown()))
}

#[derive(Default)]
pub struct FakeHost {
    users: HashMap<String, GitHubUser>,
    repos: HashMap<String, Vec<UserRepo>>,
    commits: HashMap<String, Vec<CommitDetail>>,
    pulls: HashMap<String, Vec<PullRequest>>,
    reviews: HashMap<(String, i64), Vec<PullReview>>,
    comments: HashMap<(String, i64), Vec<ReviewComment>>,
    missing_repos: HashSet<String>,
    user_error: Option<HostError>,
    /// sha -> failures left before the detail call succeeds
    flaky: Mutex<HashMap<String, u32>>,
    pull_listings: Arc<AtomicUsize>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, login: &str, id: i64) -> Self {
        self.users.insert(
            login.to_lowercase(),
            GitHubUser {
                id,
                login: login.to_owned(),
                user_type: "User".to_owned(),
                ..Default::default()
            },
        );
        self
    }

    pub fn with_user_error(mut self, err: HostError) -> Self {
        self.user_error = Some(err);
        self
    }

    pub fn with_repo(mut self, login: &str, name: &str, pushed_days_ago: i64, fork: bool) -> Self {
        let id = self.repos.values().map(Vec::len).sum::<usize>() as i64 + 1;
        self.repos.entry(login.to_lowercase()).or_default().push(UserRepo {
            id,
            name: name.to_owned(),
            full_name: format!("{}/{}", login, name),
            owner: RepoOwner {
                login: login.to_owned(),
            },
            fork,
            archived: false,
            description: Some(format!("{} service", name)),
            language: Some("Go".to_owned()),
            stargazers_count: 120,
            topics: vec!["payments".to_owned()],
            pushed_at: Some(Utc::now() - chrono::Duration::days(pushed_days_ago)),
        });
        self
    }

    pub fn with_commit(mut self, repo: &str, detail: CommitDetail) -> Self {
        self.commits.entry(repo.to_owned()).or_default().push(detail);
        self
    }

    pub fn with_missing_repo(mut self, repo: &str) -> Self {
        self.missing_repos.insert(repo.to_owned());
        self
    }

    pub fn with_flaky_detail(self, sha: &str, failures: u32) -> Self {
        self.flaky.lock().insert(sha.to_owned(), failures);
        self
    }

    pub fn with_review(
        mut self,
        repo: &str,
        pr: i64,
        author: &str,
        reviewer: &str,
        state: &str,
        comments: &[&str],
    ) -> Self {
        let opened = Utc::now() - chrono::Duration::days(3);
        self.pulls.entry(repo.to_owned()).or_default().push(PullRequest {
            number: pr,
            user: Some(UserRef {
                login: author.to_owned(),
            }),
            state: "closed".to_owned(),
            created_at: opened,
        });
        let review_id = pr * 100;
        self.reviews.entry((repo.to_owned(), pr)).or_default().push(PullReview {
            id: review_id,
            user: Some(UserRef {
                login: reviewer.to_owned(),
            }),
            state: state.to_owned(),
            body: Some("left some notes".to_owned()),
            submitted_at: Some(opened + chrono::Duration::hours(5)),
        });
        let list = self.comments.entry((repo.to_owned(), pr)).or_default();
        for (i, body) in comments.iter().enumerate() {
            list.push(ReviewComment {
                id: review_id + i as i64 + 1,
                pull_request_review_id: Some(review_id),
                user: Some(UserRef {
                    login: reviewer.to_owned(),
                }),
                body: body.to_string(),
                path: Some("api/handlers/billing.go".to_owned()),
                line: Some(10 + i as i64),
                original_line: None,
            });
        }
        self
    }

    /// Counts `list_pull_requests` calls, shared with the host once it moves.
    pub fn pull_listings(&self) -> Arc<AtomicUsize> {
        self.pull_listings.clone()
    }

    fn check_repo(&self, repo: &str) -> HostResult<()> {
        if self.missing_repos.contains(repo) {
            return Err(HostError::NotFound {
                resource: format!("repos/{}", repo),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CodeHost for FakeHost {
    async fn get_user(&self, username: &str) -> HostResult<Fetched<GitHubUser>> {
        if let Some(err) = &self.user_error {
            return Err(err.clone());
        }
        match self.users.get(&username.to_lowercase()) {
            Some(user) => fetched(user.clone()),
            None => Err(HostError::NotFound {
                resource: format!("users/{}", username),
            }),
        }
    }

    async fn list_user_repos(&self, username: &str, page: u32) -> HostResult<Fetched<Vec<UserRepo>>> {
        if page > 1 {
            return fetched(Vec::new());
        }
        fetched(self.repos.get(&username.to_lowercase()).cloned().unwrap_or_default())
    }

    async fn get_contributors(&self, repo: &str) -> HostResult<Fetched<Vec<Contributor>>> {
        self.check_repo(repo)?;
        fetched(
            (0..3)
                .map(|i| Contributor {
                    id: i,
                    login: format!("c{}", i),
                    contributions: 10,
                })
                .collect(),
        )
    }

    async fn list_commits(
        &self,
        repo: &str,
        _author: &str,
        page: u32,
        _since: Option<DateTime<Utc>>,
    ) -> HostResult<Fetched<Vec<CommitSummary>>> {
        self.check_repo(repo)?;
        if page > 1 {
            return fetched(Vec::new());
        }
        fetched(
            self.commits
                .get(repo)
                .map(|list| {
                    list.iter()
                        .map(|d| CommitSummary {
                            sha: d.sha.clone(),
                            commit: d.commit.clone(),
                            parents: d.parents.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        )
    }

    async fn get_commit_detail(&self, repo: &str, sha: &str) -> HostResult<Fetched<CommitDetail>> {
        self.check_repo(repo)?;
        {
            let mut flaky = self.flaky.lock();
            if let Some(left) = flaky.get_mut(sha) {
                if *left > 0 {
                    *left -= 1;
                    return Err(HostError::Server {
                        status: 502,
                        message: "bad gateway".to_owned(),
                    });
                }
            }
        }
        self.commits
            .get(repo)
            .and_then(|list| list.iter().find(|d| d.sha == sha))
            .cloned()
            .map(|d| Fetched::new(d, RateLimit::unknown()))
            .ok_or_else(|| HostError::NotFound {
                resource: format!("{}@{}", repo, sha),
            })
    }

    async fn list_pull_requests(&self, repo: &str, page: u32) -> HostResult<Fetched<Vec<PullRequest>>> {
        self.pull_listings.fetch_add(1, Ordering::SeqCst);
        self.check_repo(repo)?;
        if page > 1 {
            return fetched(Vec::new());
        }
        fetched(self.pulls.get(repo).cloned().unwrap_or_default())
    }

    async fn list_reviews(&self, repo: &str, pr: i64) -> HostResult<Fetched<Vec<PullReview>>> {
        fetched(
            self.reviews
                .get(&(repo.to_owned(), pr))
                .cloned()
                .unwrap_or_default(),
        )
    }

    async fn list_review_comments(&self, repo: &str, pr: i64) -> HostResult<Fetched<Vec<ReviewComment>>> {
        fetched(
            self.comments
                .get(&(repo.to_owned(), pr))
                .cloned()
                .unwrap_or_default(),
        )
    }
}

pub fn commit(sha: &str, message: &str, days_ago: i64, files: &[(&str, i64, i64, Option<&str>)]) -> CommitDetail {
    CommitDetail {
        sha: sha.to_owned(),
        commit: CommitInfo {
            author: Some(CommitSignature {
                name: Some("Octo".to_owned()),
                email: None,
                date: Some(Utc::now() - chrono::Duration::days(days_ago)),
            }),
            message: message.to_owned(),
        },
        stats: CommitStats::default(),
        files: files
            .iter()
            .map(|(name, additions, deletions, patch)| CommitFile {
                filename: name.to_string(),
                additions: *additions,
                deletions: *deletions,
                status: "modified".to_owned(),
                patch: patch.map(str::to_owned),
            })
            .collect(),
        parents: vec![],
    }
}

/// Deterministic two-dimensional embedding.
pub struct LengthEmbedder;

#[async_trait]
impl Embedder for LengthEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| vec![1.0, (t.len() % 97) as f32 / 97.0])
            .collect())
    }
}

/// Queue that only records what was enqueued.
#[derive(Default)]
pub struct RecordingQueue {
    pub tasks: Mutex<Vec<(Task, Duration)>>,
}

impl RecordingQueue {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.tasks.lock().iter().map(|(t, _)| t.name()).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }
}

#[async_trait]
impl TaskQueue for RecordingQueue {
    async fn enqueue(&self, task: Task) -> anyhow::Result<()> {
        self.tasks.lock().push((task, Duration::ZERO));
        Ok(())
    }

    async fn enqueue_after(&self, task: Task, delay: Duration) -> anyhow::Result<()> {
        self.tasks.lock().push((task, delay));
        Ok(())
    }
}

pub fn test_config() -> IngestionConfig {
    IngestionConfig {
        classify_requeue_delay_ms: 10,
        vector_defer_ms: 10,
        max_attempts: 20,
        worker_concurrency: 4,
        ..Default::default()
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub index: Arc<MemoryVectorIndex>,
    pub queue: Arc<LocalQueue>,
    pub pipeline: Arc<Pipeline>,
    pub worker: Worker,
}

pub fn harness(host: FakeHost, config: IngestionConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let index = Arc::new(MemoryVectorIndex::in_memory());
    let queue = Arc::new(LocalQueue::new());
    let services = Services {
        host: Arc::new(host),
        store: store.clone(),
        queue: queue.clone(),
        embedder: Arc::new(LengthEmbedder),
        index: index.clone(),
        label_model: None,
    };
    let pipeline = Arc::new(Pipeline::new(
        services,
        Arc::new(RateGate::default()),
        EvaluationContext::default(),
        config.clone(),
    ));
    let worker = Worker::new(pipeline.clone(), queue.clone(), &config);
    Harness {
        store,
        index,
        queue,
        pipeline,
        worker,
    }
}
