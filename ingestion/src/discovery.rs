//! Candidate repo selection for an ingestion run.

use chrono::{DateTime, Duration, Utc};
use github_handler::{CodeHost, HostError, RateGate};
use model::github::{GitHubUser, UserRepo};
use model::RepoMetadata;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::IngestionConfig;

static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^my-first|hello[-_]?world|(^|[-_.])(test|tutorial|homework|learning|practice|config)([-_.]|$))")
        .expect("valid boilerplate pattern")
});

/// Repos nobody should be judged on: dotfiles, profile READMEs, pages sites,
/// course work and scratch repos.
pub fn is_boilerplate(login: &str, name: &str) -> bool {
    let name = name.to_lowercase();
    let login = login.to_lowercase();
    name == "dotfiles"
        || name == login
        || name == format!("{}.github.io", login)
        || BOILERPLATE.is_match(&name)
}

pub fn is_candidate(login: &str, repo: &UserRepo, cutoff: DateTime<Utc>) -> bool {
    if repo.fork || is_boilerplate(login, &repo.name) {
        return false;
    }
    matches!(repo.pushed_at, Some(pushed) if pushed >= cutoff)
}

/// Filters, sorts by most recent push and bounds the candidate set.
pub fn select_candidates(
    config: &IngestionConfig,
    login: &str,
    repos: Vec<UserRepo>,
    now: DateTime<Utc>,
) -> Vec<UserRepo> {
    let cutoff = now - Duration::days(config.repo_max_age_days);
    let mut candidates: Vec<UserRepo> = repos
        .into_iter()
        .filter(|r| is_candidate(login, r, cutoff))
        .collect();
    candidates.sort_by(|a, b| {
        b.pushed_at
            .cmp(&a.pushed_at)
            .then(a.full_name.cmp(&b.full_name))
    });
    candidates.dedup_by(|a, b| a.full_name.eq_ignore_ascii_case(&b.full_name));
    candidates.truncate(config.max_repos);
    candidates
}

/// The user record plus every listed repo, up to `max_repo_pages` pages.
pub async fn fetch_identity(
    host: &dyn CodeHost,
    gate: &RateGate,
    config: &IngestionConfig,
    username: &str,
) -> Result<(GitHubUser, Vec<UserRepo>), HostError> {
    let user = gate.fetch(|| host.get_user(username)).await?;
    let mut repos = Vec::new();
    for page in 1..=config.max_repo_pages {
        let batch = gate.fetch(|| host.list_user_repos(&user.login, page)).await?;
        if batch.is_empty() {
            break;
        }
        repos.extend(batch);
    }
    Ok((user, repos))
}

/// Listing fields worth caching; merged, so zeros here never clobber.
pub fn metadata_from_listing(repo: &UserRepo, now: DateTime<Utc>) -> RepoMetadata {
    let mut meta = RepoMetadata::new(&repo.full_name, now);
    meta.description = repo.description.clone();
    meta.primary_language = repo.language.clone();
    meta.stars = repo.stargazers_count;
    meta.topics = repo.topics.clone();
    meta.fork = repo.fork;
    meta.pushed_at = repo.pushed_at;
    meta
}
