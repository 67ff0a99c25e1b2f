use model::github::{PullRequest, PullReview, ReviewComment};
use model::{review_id, Developer, Review, ReviewState};
use tracing::{debug, warn};
use uuid::Uuid;

use super::Pipeline;
use crate::error::{TaskError, TaskOutcome};

/// Review row for `review`, with its inline comments folded in. `None` for
/// unsubmitted or unrecognized reviews.
pub fn build_review(
    developer: &Developer,
    repo: &str,
    pr: &PullRequest,
    review: &PullReview,
    comments: &[ReviewComment],
) -> Option<Review> {
    let state = ReviewState::parse(&review.state)?;
    let submitted_at = review.submitted_at?;
    let own: Vec<&ReviewComment> = comments
        .iter()
        .filter(|c| c.pull_request_review_id == Some(review.id))
        .collect();
    let body_chars = review.body.as_deref().map_or(0, |b| b.trim().chars().count());
    let comment_chars: usize = own.iter().map(|c| c.body.trim().chars().count()).sum();

    Some(Review {
        id: review_id(repo, pr.number, review.id),
        developer_id: developer.id.clone(),
        repo: repo.to_owned(),
        pr_number: pr.number,
        pr_author: pr.user.as_ref().map(|u| u.login.to_lowercase()),
        pr_opened_at: Some(pr.created_at),
        state,
        comment_count: own.len() as i32,
        comment_chars: (comment_chars + body_chars) as i64,
        references_code: own.iter().any(|c| c.references_code()),
        submitted_at,
    })
}

fn is_by(login: &str, user: Option<&model::github::UserRef>) -> bool {
    user.is_some_and(|u| u.login.eq_ignore_ascii_case(login))
}

impl Pipeline {
    /// Second half of a repo unit; always reports the unit complete unless
    /// the failure is worth a retry.
    pub(crate) async fn analyze_reviews(
        &self,
        developer_id: &str,
        run_id: Uuid,
        repo: &str,
    ) -> Result<TaskOutcome, TaskError> {
        let developer = match self.live_run(developer_id, run_id).await? {
            Ok(developer) => developer,
            Err(outcome) => return Ok(outcome),
        };

        match self.collect_reviews(&developer, repo).await {
            Ok(stored) => debug!("{}: {} new reviews in {}", developer_id, stored, repo),
            Err(TaskError::Upstream(e)) if !e.is_transient() => {
                warn!("skipping reviews in {} for {}: {}", repo, developer_id, e)
            }
            Err(e) => return Err(e),
        }

        self.coordinator
            .on_unit_complete(developer_id, run_id, repo)
            .await?;
        Ok(TaskOutcome::Done)
    }

    async fn collect_reviews(&self, developer: &Developer, repo: &str) -> Result<usize, TaskError> {
        let mut stored = 0;
        for page in 1..=self.config.max_pr_pages {
            let prs = self
                .gate
                .fetch(|| self.host.list_pull_requests(repo, page))
                .await?;
            if prs.is_empty() {
                break;
            }
            for pr in prs.iter().filter(|pr| !is_by(&developer.username, pr.user.as_ref())) {
                let reviews = match self.reviews_on(developer, repo, pr).await {
                    Ok(reviews) => reviews,
                    Err(TaskError::Upstream(e)) if !e.is_transient() => {
                        warn!("skipping {}#{}: {}", repo, pr.number, e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                for review in reviews {
                    if self
                        .store
                        .insert_review_if_absent(&review)
                        .await
                        .map_err(TaskError::Store)?
                    {
                        stored += 1;
                    }
                }
            }
        }
        Ok(stored)
    }

    async fn reviews_on(
        &self,
        developer: &Developer,
        repo: &str,
        pr: &PullRequest,
    ) -> Result<Vec<Review>, TaskError> {
        let reviews = self
            .gate
            .fetch(|| self.host.list_reviews(repo, pr.number))
            .await?;
        let mine: Vec<&PullReview> = reviews
            .iter()
            .filter(|r| is_by(&developer.username, r.user.as_ref()))
            .collect();
        if mine.is_empty() {
            return Ok(Vec::new());
        }
        let comments = self
            .gate
            .fetch(|| self.host.list_review_comments(repo, pr.number))
            .await?;
        Ok(mine
            .into_iter()
            .filter_map(|r| build_review(developer, repo, pr, r, &comments))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use model::github::UserRef;

    fn user(login: &str) -> Option<UserRef> {
        Some(UserRef {
            login: login.to_owned(),
        })
    }

    fn comment(review: i64, body: &str, line: Option<i64>) -> ReviewComment {
        ReviewComment {
            id: 1,
            pull_request_review_id: Some(review),
            user: user("octo"),
            body: body.to_owned(),
            path: Some("src/lib.rs".to_owned()),
            line,
            original_line: None,
        }
    }

    #[test]
    fn test_build_review_folds_comments() {
        let now = Utc::now();
        let dev = Developer::new("octo", now);
        let pr = PullRequest {
            number: 7,
            user: user("Alice"),
            state: "closed".to_owned(),
            created_at: now - Duration::hours(2),
        };
        let review = PullReview {
            id: 11,
            user: user("Octo"),
            state: "CHANGES_REQUESTED".to_owned(),
            body: Some("needs work".to_owned()),
            submitted_at: Some(now),
        };
        let comments = vec![
            comment(11, "off by one", Some(12)),
            comment(11, "nit", None),
            comment(99, "someone else", Some(3)),
        ];
        let r = build_review(&dev, "acme/api", &pr, &review, &comments).unwrap();
        assert_eq!(r.state, ReviewState::ChangesRequested);
        assert_eq!(r.comment_count, 2);
        assert_eq!(r.comment_chars, 10 + 3 + 10);
        assert!(r.references_code);
        assert_eq!(r.pr_author.as_deref(), Some("alice"));
    }

    #[test]
    fn test_unsubmitted_review_is_dropped() {
        let now = Utc::now();
        let pr = PullRequest {
            number: 1,
            user: user("alice"),
            state: "open".to_owned(),
            created_at: now,
        };
        let review = PullReview {
            id: 2,
            user: user("octo"),
            state: "PENDING".to_owned(),
            body: None,
            submitted_at: None,
        };
        assert!(build_review(&Developer::new("octo", now), "a/b", &pr, &review, &[]).is_none());
        assert!(is_by("OCTO", user("octo").as_ref()));
    }
}
