//! Effort/quality formula: one bounded, log-scaled quality score per
//! contribution, plus recency decay for aggregation.
//!
//! ```text
//! SEU       = ln(1+churn) · (1 + fileCoeff·ln(1+files)) · (1 + entropyCoeff·entropy)
//! EffortH   = SEU · (1 + ccCoeff·|Δcc|) · (1 + centralityCoeff·centrality)
//! QualityH  = clamp(base + maintWeight·maintainable + testWeight·testRatio, qMin, qMax)
//! ValueH    = EffortH · QualityH · typeWeight
//! quality   = min(100, ln(1+ValueH) / ln(1+REF) · 100)
//! ```

use chrono::{DateTime, Utc};
use model::{Contribution, ContributionType, RepoMetadata, CURRENT_SCORE_VERSION};

use crate::config::FormulaConfig;

const DAYS_PER_MONTH: f64 = 30.44;

/// Complexity growth at which maintainability credit reaches zero.
const MAINTAINABILITY_HORIZON: i32 = 20;

/// Sub-linear effort proxy; padding churn barely moves it.
pub fn seu(cfg: &FormulaConfig, churn: i64, file_count: i32, entropy: f64) -> f64 {
    let churn = churn.max(0) as f64;
    let files = file_count.max(0) as f64;
    let entropy = if entropy.is_finite() {
        entropy.clamp(0.0, 1.0)
    } else {
        0.0
    };
    churn.ln_1p() * (1.0 + cfg.file_coeff * files.ln_1p()) * (1.0 + cfg.entropy_coeff * entropy)
}

fn star_step(stars: i64) -> f64 {
    match stars {
        s if s >= 1000 => 0.5,
        s if s >= 100 => 0.3,
        s if s >= 10 => 0.1,
        _ => 0.0,
    }
}

fn contributor_step(contributors: i64) -> f64 {
    match contributors {
        c if c >= 50 => 0.5,
        c if c >= 20 => 0.3,
        c if c >= 5 => 0.1,
        _ => 0.0,
    }
}

/// Ecosystem importance of a repository in [0, 1].
pub fn centrality(stars: i64, contributors: i64) -> f64 {
    (star_step(stars) + contributor_step(contributors)).min(1.0)
}

pub fn effort(cfg: &FormulaConfig, seu: f64, complexity_delta: i32, centrality: f64) -> f64 {
    seu * (1.0 + cfg.complexity_coeff * complexity_delta.unsigned_abs() as f64)
        * (1.0 + cfg.centrality_coeff * centrality)
}

/// Full credit at flat or reduced complexity, linear down to 0 at +20.
pub fn maintainable_share(complexity_delta: i32) -> f64 {
    let grown = complexity_delta.clamp(0, MAINTAINABILITY_HORIZON) as f64;
    (1.0 - grown / MAINTAINABILITY_HORIZON as f64).max(0.0)
}

pub fn quality(cfg: &FormulaConfig, complexity_delta: i32, test_ratio: f64) -> f64 {
    let test_ratio = if test_ratio.is_finite() { test_ratio } else { 0.0 };
    let raw = cfg.quality_base
        + cfg.maintainability_weight * maintainable_share(complexity_delta)
        + cfg.test_weight * test_ratio;
    raw.clamp(cfg.quality_min, cfg.quality_max)
}

/// Fixed per-type multiplier; an unclassified contribution counts as unknown.
pub fn type_weight(contribution_type: Option<ContributionType>) -> f64 {
    match contribution_type {
        Some(ContributionType::Feature)
        | Some(ContributionType::Bugfix)
        | Some(ContributionType::Security) => 1.0,
        Some(ContributionType::Performance) => 0.9,
        Some(ContributionType::Refactor) => 0.8,
        Some(ContributionType::Test) => 0.7,
        Some(ContributionType::Docs) => 0.6,
        Some(ContributionType::Config) => 0.4,
        Some(ContributionType::Chore) => 0.3,
        Some(ContributionType::Dependency) => 0.2,
        Some(ContributionType::Formatting) => 0.1,
        Some(ContributionType::Generated) => 0.0,
        Some(ContributionType::Other) | None => 0.5,
    }
}

/// Log-normalizes ValueH against the calibration constant onto [0, 100].
pub fn quality_score(cfg: &FormulaConfig, value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    (value.ln_1p() / cfg.reference_value.ln_1p() * 100.0).clamp(0.0, 100.0)
}

pub fn months_since(authored_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - authored_at).num_seconds().max(0) as f64 / 86_400.0;
    days / DAYS_PER_MONTH
}

/// `exp(-λ·months)`; 1.0 for anything authored now or in the future.
pub fn recency_factor(cfg: &FormulaConfig, authored_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (-cfg.recency_lambda * months_since(authored_at, now)).exp()
}

pub fn recency_weighted(
    cfg: &FormulaConfig,
    quality_score: f64,
    authored_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f64 {
    quality_score * recency_factor(cfg, authored_at, now)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormulaInput {
    pub churn: i64,
    pub file_count: i32,
    pub entropy: f64,
    pub complexity_delta: i32,
    pub test_ratio: f64,
    pub stars: i64,
    pub contributors: i64,
    pub contribution_type: Option<ContributionType>,
}

impl FormulaInput {
    pub fn from_contribution(contribution: &Contribution, repo: Option<&RepoMetadata>) -> Self {
        Self {
            churn: contribution.churn,
            file_count: contribution.file_count,
            entropy: contribution.entropy,
            complexity_delta: contribution.complexity_delta,
            test_ratio: contribution.test_ratio,
            stars: repo.map_or(0, |r| r.stars),
            contributors: repo.map_or(0, |r| r.contributors),
            contribution_type: contribution.contribution_type,
        }
    }
}

/// Every intermediate term of one contribution's score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub seu: f64,
    pub centrality: f64,
    pub effort: f64,
    pub quality: f64,
    pub type_weight: f64,
    pub value: f64,
    pub quality_score: f64,
}

pub fn score(cfg: &FormulaConfig, input: &FormulaInput) -> ScoreBreakdown {
    let seu = seu(cfg, input.churn, input.file_count, input.entropy);
    let centrality = centrality(input.stars, input.contributors);
    let effort = effort(cfg, seu, input.complexity_delta, centrality);
    let quality = quality(cfg, input.complexity_delta, input.test_ratio);
    let type_weight = type_weight(input.contribution_type);
    let value = effort * quality * type_weight;

    ScoreBreakdown {
        seu,
        centrality,
        effort,
        quality,
        type_weight,
        value,
        quality_score: quality_score(cfg, value),
    }
}

/// Scores a classified contribution in place. The stored quality score is the
/// undecayed value; `recency_weighted` is a snapshot taken at `now`.
pub fn apply_score(
    cfg: &FormulaConfig,
    contribution: &mut Contribution,
    repo: Option<&RepoMetadata>,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let breakdown = score(cfg, &FormulaInput::from_contribution(contribution, repo));
    contribution.quality_score = Some(breakdown.quality_score);
    contribution.recency_weighted = Some(recency_weighted(
        cfg,
        breakdown.quality_score,
        contribution.authored_at,
        now,
    ));
    contribution.scored = true;
    contribution.score_version = CURRENT_SCORE_VERSION;
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn cfg() -> FormulaConfig {
        FormulaConfig::default()
    }

    fn input(t: ContributionType) -> FormulaInput {
        FormulaInput {
            churn: 240,
            file_count: 6,
            entropy: 0.7,
            complexity_delta: 3,
            test_ratio: 0.1,
            stars: 150,
            contributors: 12,
            contribution_type: Some(t),
        }
    }

    #[test]
    fn test_seu_zero_churn() {
        assert_eq!(seu(&cfg(), 0, 10, 1.0), 0.0);
    }

    #[test]
    fn test_seu_is_sublinear_in_churn() {
        let c = cfg();
        let single = seu(&c, 500, 4, 0.5);
        let doubled = seu(&c, 1000, 4, 0.5);
        assert!(doubled > single);
        assert!(doubled < 2.0 * single);
    }

    #[test]
    fn test_centrality_steps() {
        assert_eq!(centrality(0, 0), 0.0);
        assert_eq!(centrality(10, 4), 0.1);
        assert_eq!(centrality(150, 25), 0.6);
        assert_eq!(centrality(5000, 500), 1.0);
    }

    #[test]
    fn test_maintainable_share() {
        assert_eq!(maintainable_share(-5), 1.0);
        assert_eq!(maintainable_share(0), 1.0);
        assert_eq!(maintainable_share(10), 0.5);
        assert_eq!(maintainable_share(20), 0.0);
        assert_eq!(maintainable_share(45), 0.0);
    }

    #[test]
    fn test_generated_scores_zero() {
        let b = score(&cfg(), &input(ContributionType::Generated));
        assert_eq!(b.value, 0.0);
        assert_eq!(b.quality_score, 0.0);
    }

    #[test]
    fn test_feature_outscores_formatting() {
        let feature = score(&cfg(), &input(ContributionType::Feature));
        let formatting = score(&cfg(), &input(ContributionType::Formatting));
        assert!(feature.quality_score > formatting.quality_score);
        assert!(feature.quality_score > 0.0 && feature.quality_score <= 100.0);
    }

    #[test]
    fn test_unknown_type_weight() {
        assert_eq!(type_weight(None), 0.5);
        assert_eq!(type_weight(Some(ContributionType::Other)), 0.5);
    }

    #[test]
    fn test_recency_now_and_past() {
        let c = cfg();
        let now = Utc::now();
        assert!((recency_weighted(&c, 80.0, now, now) - 80.0).abs() < 1e-9);
        assert_eq!(recency_weighted(&c, 80.0, now + Duration::days(3), now), 80.0);
        let old = recency_weighted(&c, 80.0, now - Duration::days(365), now);
        assert!(old < 80.0 && old > 50.0);
    }

    proptest! {
        #[test]
        fn prop_seu_grows_with_files_and_entropy(
            churn in 1i64..100_000,
            files in 0i32..500,
            entropy in 0.0f64..0.99,
        ) {
            let c = cfg();
            let base = seu(&c, churn, files, entropy);
            prop_assert!(seu(&c, churn, files + 1, entropy) > base);
            prop_assert!(seu(&c, churn, files, entropy + 0.01) > base);
        }

        #[test]
        fn prop_quality_bounded_and_monotone(
            delta in -200i32..200,
            test_ratio in -0.2f64..0.3,
        ) {
            let c = cfg();
            let q = quality(&c, delta, test_ratio);
            prop_assert!(q >= c.quality_min && q <= c.quality_max);
            prop_assert!(quality(&c, delta + 1, test_ratio) <= q);
            prop_assert!(quality(&c, delta, test_ratio + 0.01) >= q);
        }

        #[test]
        fn prop_quality_score_bounded(
            churn in 0i64..10_000_000,
            files in 0i32..10_000,
            entropy in 0.0f64..=1.0,
            delta in -10_000i32..10_000,
            stars in 0i64..1_000_000,
            contributors in 0i64..10_000,
            idx in 0usize..13,
            days_ago in 0i64..5_000,
        ) {
            let c = cfg();
            let b = score(&c, &FormulaInput {
                churn,
                file_count: files,
                entropy,
                complexity_delta: delta,
                test_ratio: 0.0,
                stars,
                contributors,
                contribution_type: Some(ContributionType::ALL[idx]),
            });
            prop_assert!((0.0..=100.0).contains(&b.quality_score));
            let now = Utc::now();
            let weighted = recency_weighted(&c, b.quality_score, now - Duration::days(days_ago), now);
            prop_assert!(weighted <= b.quality_score + 1e-12);
            prop_assert!(weighted >= 0.0);
        }
    }
}
