//! Per-developer aggregation inputs plus the domain score and portfolio
//! rollups that feed search.

use chrono::{DateTime, Duration, Utc};
use model::{Contribution, DomainScore, RepoMetadata, RepoPortfolio, Review, MAX_DOMAINS};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::EvaluationContext;
use crate::formula;

/// Everything the dimension passes look at for one developer.
#[derive(Debug, Clone)]
pub struct DeveloperActivity {
    pub developer_id: String,
    pub login: String,
    pub contributions: Vec<Contribution>,
    pub reviews: Vec<Review>,
    pub repos: HashMap<String, RepoMetadata>,
    pub now: DateTime<Utc>,
}

impl DeveloperActivity {
    pub fn new(developer_id: &str, login: &str, now: DateTime<Utc>) -> Self {
        Self {
            developer_id: developer_id.to_owned(),
            login: login.to_owned(),
            contributions: Vec::new(),
            reviews: Vec::new(),
            repos: HashMap::new(),
            now,
        }
    }

    /// Contributions that made it through classification and scoring.
    pub fn scored(&self) -> impl Iterator<Item = &Contribution> {
        self.contributions
            .iter()
            .filter(|c| c.scored && c.classified && c.quality_score.is_some())
    }

    pub fn repo(&self, full_name: &str) -> Option<&RepoMetadata> {
        self.repos.get(full_name)
    }
}

/// `min(1, ln(1+x)/ln(1+reference))`, 0 for non-positive input.
pub fn log_norm(x: f64, reference: f64) -> f64 {
    if x <= 0.0 || reference <= 0.0 {
        return 0.0;
    }
    (x.ln_1p() / reference.ln_1p()).min(1.0)
}

/// Quality score decayed to `now`.
pub fn decayed_quality(ctx: &EvaluationContext, c: &Contribution, now: DateTime<Utc>) -> f64 {
    let q = c.quality_score.unwrap_or(0.0);
    formula::recency_weighted(&ctx.formula, q, c.authored_at, now)
}

pub fn domain_scores(ctx: &EvaluationContext, activity: &DeveloperActivity) -> Vec<DomainScore> {
    struct Bucket<'a> {
        weighted: f64,
        count: i32,
        repos: HashMap<&'a str, i32>,
    }

    let mut buckets: BTreeMap<&str, Bucket> = BTreeMap::new();
    for c in activity.scored() {
        let weighted = decayed_quality(ctx, c, activity.now);
        for domain in &c.domains {
            let bucket = buckets.entry(domain.as_str()).or_insert_with(|| Bucket {
                weighted: 0.0,
                count: 0,
                repos: HashMap::new(),
            });
            bucket.weighted += weighted;
            bucket.count += 1;
            *bucket.repos.entry(c.repo.as_str()).or_insert(0) += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(domain, bucket)| {
            let mut repos: Vec<(&str, i32)> = bucket.repos.into_iter().collect();
            repos.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
            DomainScore {
                developer_id: activity.developer_id.clone(),
                domain: domain.to_owned(),
                score: log_norm(bucket.weighted, ctx.aggregation.domain_ref) * 100.0,
                contribution_count: bucket.count,
                evidence_repos: repos
                    .into_iter()
                    .take(ctx.aggregation.evidence_repos)
                    .map(|(r, _)| r.to_owned())
                    .collect(),
                updated_at: activity.now,
            }
        })
        .collect()
}

/// Highest-scoring domains first, capped for profile tags.
pub fn top_domains(scores: &[DomainScore]) -> Vec<String> {
    let mut ranked: Vec<&DomainScore> = scores.iter().filter(|d| d.score > 0.0).collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.domain.cmp(&b.domain))
    });
    ranked
        .into_iter()
        .take(MAX_DOMAINS)
        .map(|d| d.domain.clone())
        .collect()
}

const PROFILE_LANGUAGES: usize = 10;

/// Languages across all contributions, most frequent first.
pub fn profile_languages(activity: &DeveloperActivity) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for c in &activity.contributions {
        for lang in &c.languages {
            *counts.entry(lang.as_str()).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(PROFILE_LANGUAGES)
        .map(|(l, _)| l.to_owned())
        .collect()
}

/// One portfolio entry per repo the developer committed to, rebuilt wholesale.
pub fn portfolios(ctx: &EvaluationContext, activity: &DeveloperActivity) -> Vec<RepoPortfolio> {
    let recent_cutoff = activity.now - Duration::days(ctx.aggregation.recent_days);
    let mut by_repo: BTreeMap<&str, Vec<&Contribution>> = BTreeMap::new();
    for c in &activity.contributions {
        by_repo.entry(c.repo.as_str()).or_default().push(c);
    }

    by_repo
        .into_iter()
        .map(|(repo, contributions)| {
            let meta = activity.repo(repo);
            let recent = contributions
                .iter()
                .filter(|c| c.authored_at >= recent_cutoff)
                .count() as i32;

            let mut languages: Vec<String> = Vec::new();
            let mut domains: BTreeSet<&str> = BTreeSet::new();
            let mut types: BTreeMap<&str, usize> = BTreeMap::new();
            for c in &contributions {
                for lang in &c.languages {
                    if !languages.contains(lang) {
                        languages.push(lang.clone());
                    }
                }
                domains.extend(c.domains.iter().map(String::as_str));
                if let Some(t) = c.contribution_type {
                    *types.entry(t.as_str()).or_insert(0) += 1;
                }
            }
            if languages.is_empty() {
                if let Some(lang) = meta.and_then(|m| m.primary_language.as_ref()) {
                    languages.push(lang.to_lowercase());
                }
            }

            let mut summary = repo.to_owned();
            if let Some(desc) = meta.and_then(|m| m.description.as_deref()).filter(|d| !d.is_empty()) {
                summary.push_str(": ");
                summary.push_str(desc);
            }
            summary.push_str(&format!(
                ". {} contributions ({} recent)",
                contributions.len(),
                recent
            ));
            if !languages.is_empty() {
                summary.push_str(&format!(". Languages: {}", languages.join(", ")));
            }
            if !domains.is_empty() {
                summary.push_str(&format!(
                    ". Domains: {}",
                    domains.into_iter().collect::<Vec<_>>().join(", ")
                ));
            }
            if !types.is_empty() {
                let mut ranked: Vec<(&str, usize)> = types.into_iter().collect();
                ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
                let kinds: Vec<&str> = ranked.into_iter().take(3).map(|(t, _)| t).collect();
                summary.push_str(&format!(". Mostly {}", kinds.join(", ")));
            }
            if let Some(topics) = meta.map(|m| &m.topics).filter(|t| !t.is_empty()) {
                summary.push_str(&format!(". Topics: {}", topics.join(", ")));
            }

            RepoPortfolio {
                developer_id: activity.developer_id.clone(),
                repo: repo.to_owned(),
                summary,
                stars: meta.map_or(0, |m| m.stars),
                contributors: meta.map_or(0, |m| m.contributors),
                recent_contributions: recent,
                total_contributions: contributions.len() as i32,
                languages,
                updated_at: activity.now,
            }
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use model::ContributionType;

    fn activity() -> DeveloperActivity {
        let mut a = DeveloperActivity::new("octo", "Octo", now());
        a.contributions = vec![
            contribution("acme/api", "a1", ContributionType::Feature, &["backend"], 60.0, 1),
            contribution("acme/api", "a2", ContributionType::Bugfix, &["backend", "databases"], 40.0, 10),
            contribution("zeta/web", "b1", ContributionType::Feature, &["backend", "frontend"], 50.0, 400),
        ];
        let mut meta = RepoMetadata::new("acme/api", now());
        meta.description = Some("Billing API".to_owned());
        meta.stars = 1200;
        a.repos.insert("acme/api".to_owned(), meta);
        a
    }

    #[test]
    fn test_log_norm() {
        assert_eq!(log_norm(0.0, 10.0), 0.0);
        assert_eq!(log_norm(-3.0, 10.0), 0.0);
        assert!((log_norm(10.0, 10.0) - 1.0).abs() < 1e-12);
        assert_eq!(log_norm(1e9, 10.0), 1.0);
    }

    #[test]
    fn test_domain_scores_group_by_tag() {
        let ctx = EvaluationContext::default();
        let scores = domain_scores(&ctx, &activity());
        let backend = scores.iter().find(|d| d.domain == "backend").unwrap();
        assert_eq!(backend.contribution_count, 3);
        assert_eq!(backend.evidence_repos, vec!["acme/api", "zeta/web"]);
        assert!(backend.score > 0.0 && backend.score <= 100.0);

        let frontend = scores.iter().find(|d| d.domain == "frontend").unwrap();
        assert!(frontend.score < backend.score);
        assert_eq!(top_domains(&scores)[0], "backend");
    }

    #[test]
    fn test_unscored_contributions_are_ignored() {
        let ctx = EvaluationContext::default();
        let mut a = activity();
        for c in &mut a.contributions {
            c.scored = false;
        }
        assert!(domain_scores(&ctx, &a).is_empty());
    }

    #[test]
    fn test_portfolios() {
        let ctx = EvaluationContext::default();
        let list = portfolios(&ctx, &activity());
        assert_eq!(list.len(), 2);
        let api = &list[0];
        assert_eq!(api.repo, "acme/api");
        assert_eq!(api.total_contributions, 2);
        assert_eq!(api.recent_contributions, 2);
        assert_eq!(api.stars, 1200);
        assert!(api.summary.starts_with("acme/api: Billing API"));
        assert_eq!(list[1].recent_contributions, 0);
        assert_eq!(profile_languages(&activity()), vec!["rust"]);
    }
}
