use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoMetadata {
    /// `owner/name`
    pub full_name: String,
    pub description: Option<String>,
    pub primary_language: Option<String>,
    pub stars: i64,
    pub contributors: i64,
    pub has_tests: bool,
    pub topics: Vec<String>,
    pub fork: bool,
    pub pushed_at: Option<DateTime<Utc>>,
    pub cached_at: DateTime<Utc>,
}

impl RepoMetadata {
    pub fn new(full_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            full_name: full_name.to_owned(),
            description: None,
            primary_language: None,
            stars: 0,
            contributors: 0,
            has_tests: false,
            topics: Vec::new(),
            fork: false,
            pushed_at: None,
            cached_at: now,
        }
    }

    pub fn owner(&self) -> &str {
        self.full_name.split('/').next().unwrap_or(&self.full_name)
    }

    /// Never-regress merge: an incoming null/zero/empty value keeps whatever
    /// `self` already had.
    pub fn merge(self, incoming: RepoMetadata) -> RepoMetadata {
        RepoMetadata {
            full_name: self.full_name,
            description: non_empty(incoming.description).or(self.description),
            primary_language: non_empty(incoming.primary_language).or(self.primary_language),
            stars: if incoming.stars > 0 { incoming.stars } else { self.stars },
            contributors: if incoming.contributors > 0 {
                incoming.contributors
            } else {
                self.contributors
            },
            has_tests: self.has_tests || incoming.has_tests,
            topics: if incoming.topics.is_empty() {
                self.topics
            } else {
                incoming.topics
            },
            fork: self.fork || incoming.fork,
            pushed_at: match (self.pushed_at, incoming.pushed_at) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => b.or(a),
            },
            cached_at: incoming.cached_at.max(self.cached_at),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub developer_id: String,
    pub domain: String,
    pub score: f64,
    pub contribution_count: i32,
    pub evidence_repos: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// Per-(developer, repo) summary rebuilt on every scoring pass; used as an
/// embedding source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoPortfolio {
    pub developer_id: String,
    pub repo: String,
    pub summary: String,
    pub stars: i64,
    pub contributors: i64,
    pub recent_contributions: i32,
    pub total_contributions: i32,
    pub languages: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_never_clobbers_with_placeholder() {
        let now = Utc::now();
        let mut existing = RepoMetadata::new("acme/widget", now);
        existing.description = Some("Widgets".into());
        existing.stars = 120;
        existing.contributors = 7;
        existing.has_tests = true;
        existing.topics = vec!["rust".into()];

        let mut incoming = RepoMetadata::new("acme/widget", now);
        incoming.description = Some("  ".into());
        incoming.primary_language = Some("Rust".into());

        let merged = existing.merge(incoming);
        assert_eq!(merged.description.as_deref(), Some("Widgets"));
        assert_eq!(merged.primary_language.as_deref(), Some("Rust"));
        assert_eq!(merged.stars, 120);
        assert_eq!(merged.contributors, 7);
        assert!(merged.has_tests);
        assert_eq!(merged.topics, vec!["rust".to_string()]);
    }

    #[test]
    fn test_merge_takes_fresh_values() {
        let now = Utc::now();
        let mut existing = RepoMetadata::new("acme/widget", now);
        existing.stars = 10;
        let mut incoming = RepoMetadata::new("acme/widget", now);
        incoming.stars = 11;
        assert_eq!(existing.merge(incoming).stars, 11);
    }
}
