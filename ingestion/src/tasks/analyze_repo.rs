use chrono::{DateTime, Utc};
use evaluate::signals::FileCategory;
use evaluate::extract_commit_signals;
use model::github::CommitDetail;
use model::{contribution_id, Contribution, Developer, RepoMetadata, Task};
use tracing::{info, warn};
use uuid::Uuid;

use super::Pipeline;
use crate::error::{TaskError, TaskOutcome};

const MESSAGE_MAX_CHARS: usize = 200;

/// First line of the commit message, bounded.
pub fn summary_line(message: &str) -> String {
    message
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .chars()
        .take(MESSAGE_MAX_CHARS)
        .collect()
}

/// Unclassified, unscored contribution row for one commit.
pub fn build_contribution(
    developer_id: &str,
    repo: &str,
    detail: &CommitDetail,
    now: DateTime<Utc>,
) -> Contribution {
    let signals = extract_commit_signals(&detail.files);
    // oversized commits come back without a file list
    let (additions, deletions) = if detail.files.is_empty() {
        (detail.stats.additions, detail.stats.deletions)
    } else {
        (signals.additions, signals.deletions)
    };
    Contribution {
        id: contribution_id(repo, &detail.sha),
        developer_id: developer_id.to_owned(),
        repo: repo.to_owned(),
        sha: detail.sha.clone(),
        message: summary_line(&detail.commit.message),
        authored_at: detail
            .commit
            .author
            .as_ref()
            .and_then(|a| a.date)
            .unwrap_or(now),
        additions,
        deletions,
        file_count: signals.file_count,
        churn: additions + deletions,
        entropy: signals.entropy,
        complexity_delta: signals.complexity_delta,
        abs_complexity_delta: signals.abs_complexity_delta(),
        test_ratio: signals.test_ratio,
        languages: signals.languages.clone(),
        file_paths: signals.file_paths.clone(),
        formatting_only: signals.formatting_only,
        contribution_type: None,
        domains: Vec::new(),
        classified: false,
        quality_score: None,
        recency_weighted: None,
        scored: false,
        score_version: 0,
    }
}

fn touches_tests(detail: &CommitDetail) -> bool {
    detail
        .files
        .iter()
        .any(|f| evaluate::signals::classify_file(&f.filename) == FileCategory::Test)
}

impl Pipeline {
    pub(crate) async fn analyze_repo(
        &self,
        developer_id: &str,
        run_id: Uuid,
        repo: &str,
    ) -> Result<TaskOutcome, TaskError> {
        let developer = match self.live_run(developer_id, run_id).await? {
            Ok(developer) => developer,
            Err(outcome) => return Ok(outcome),
        };

        match self.collect_commits(&developer, repo).await {
            Ok(inserted) => info!("{}: {} new contributions in {}", developer_id, inserted, repo),
            Err(TaskError::Upstream(e)) if !e.is_transient() => {
                warn!("skipping {} for {}: {}", repo, developer_id, e);
                self.coordinator
                    .on_unit_complete(developer_id, run_id, repo)
                    .await?;
                return Ok(TaskOutcome::Done);
            }
            Err(e) => return Err(e),
        }

        self.queue
            .enqueue(Task::AnalyzeReviews {
                developer_id: developer_id.to_owned(),
                run_id,
                repo: repo.to_owned(),
            })
            .await
            .map_err(TaskError::Store)?;
        Ok(TaskOutcome::Done)
    }

    async fn collect_commits(&self, developer: &Developer, repo: &str) -> Result<usize, TaskError> {
        let now = Utc::now();
        let mut meta = RepoMetadata::new(repo, now);
        match self.gate.fetch(|| self.host.get_contributors(repo)).await {
            Ok(contributors) => meta.contributors = contributors.len() as i64,
            Err(e) if e.is_transient() => return Err(e.into()),
            Err(e) => warn!("no contributor list for {}: {}", repo, e),
        }

        let mut inserted = 0;
        for page in 1..=self.config.max_commit_pages {
            let commits = self
                .gate
                .fetch(|| {
                    self.host
                        .list_commits(repo, &developer.username, page, developer.last_ingested_at)
                })
                .await?;
            if commits.is_empty() {
                break;
            }
            for summary in commits.iter().filter(|c| !c.is_merge()) {
                let detail = match self
                    .gate
                    .fetch(|| self.host.get_commit_detail(repo, &summary.sha))
                    .await
                {
                    Ok(detail) => detail,
                    Err(e) if e.is_transient() => return Err(e.into()),
                    Err(e) => {
                        warn!("skipping commit {} in {}: {}", summary.sha, repo, e);
                        continue;
                    }
                };
                meta.has_tests |= touches_tests(&detail);
                let contribution = build_contribution(&developer.id, repo, &detail, now);
                if self
                    .store
                    .insert_contribution_if_absent(&contribution)
                    .await
                    .map_err(TaskError::Store)?
                {
                    inserted += 1;
                }
            }
        }

        self.store
            .merge_repo_metadata(meta)
            .await
            .map_err(TaskError::Store)?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::github::{CommitFile, CommitInfo, CommitSignature, CommitStats};

    fn detail(files: Vec<CommitFile>, message: &str) -> CommitDetail {
        CommitDetail {
            sha: "abc".to_owned(),
            commit: CommitInfo {
                author: Some(CommitSignature {
                    name: None,
                    email: None,
                    date: Some(Utc::now()),
                }),
                message: message.to_owned(),
            },
            stats: CommitStats {
                additions: 500,
                deletions: 20,
                total: 520,
            },
            files,
            parents: vec![],
        }
    }

    fn file(name: &str, additions: i64, deletions: i64) -> CommitFile {
        CommitFile {
            filename: name.to_owned(),
            additions,
            deletions,
            status: "modified".to_owned(),
            patch: None,
        }
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(summary_line("Fix parser\n\nlong body"), "Fix parser");
        assert_eq!(summary_line(&"x".repeat(300)).len(), MESSAGE_MAX_CHARS);
        assert_eq!(summary_line(""), "");
    }

    #[test]
    fn test_build_contribution() {
        let d = detail(
            vec![file("src/lib.rs", 30, 10), file("tests/it.rs", 10, 0)],
            "feat: add parser\n\ndetails",
        );
        let c = build_contribution("octo", "acme/api", &d, Utc::now());
        assert_eq!(c.id, contribution_id("acme/api", "abc"));
        assert_eq!(c.message, "feat: add parser");
        assert_eq!(c.churn, 50);
        assert_eq!(c.file_count, 2);
        assert!(!c.classified && !c.scored);
        assert!(touches_tests(&d));
    }

    #[test]
    fn test_missing_file_list_uses_stats() {
        let c = build_contribution("octo", "acme/api", &detail(vec![], "huge"), Utc::now());
        assert_eq!(c.churn, 520);
    }
}
