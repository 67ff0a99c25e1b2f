use crate::aggregate::{self, DeveloperActivity};
use crate::config::EvaluationContext;
use crate::pass::code_quality::CodeQuality;
use crate::pass::collaboration::Collaboration;
use crate::pass::consistency::Consistency;
use crate::pass::documentation::Documentation;
use crate::pass::impact::Impact;
use crate::pass::review_quality::ReviewQuality;
use crate::pass::AnyEvaluationPass;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use model::{Developer, DimensionScores, DomainScore, RepoPortfolio, CURRENT_SCORE_VERSION};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Output of one aggregation pass over a developer.
#[derive(Debug, Clone)]
pub struct DeveloperEvaluation {
    pub scores: DimensionScores,
    pub overall: f64,
    pub domain_scores: Vec<DomainScore>,
    pub portfolios: Vec<RepoPortfolio>,
    pub languages: Vec<String>,
    pub top_domains: Vec<String>,
}

impl DeveloperEvaluation {
    /// Writes the denormalized profile fields onto the developer record.
    pub fn apply_to(&self, developer: &mut Developer, now: DateTime<Utc>) {
        developer.scores = self.scores;
        developer.overall_score = self.overall;
        developer.languages = self.languages.clone();
        developer.top_domains = self.top_domains.clone();
        developer.score_version = Some(CURRENT_SCORE_VERSION);
        developer.scored_at = Some(now);
        developer.updated_at = now;
    }
}

pub struct EvaluationManager {
    passes: Vec<Arc<dyn AnyEvaluationPass>>,
}

impl Default for EvaluationManager {
    fn default() -> Self {
        let mut manager = Self::new();
        manager.add_default_passes();
        manager
    }
}

impl EvaluationManager {
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    // 六个维度的默认 Pass
    pub fn add_default_passes(&mut self) {
        self.add_pass(Arc::new(CodeQuality));
        self.add_pass(Arc::new(ReviewQuality::default()));
        self.add_pass(Arc::new(Documentation));
        self.add_pass(Arc::new(Collaboration));
        self.add_pass(Arc::new(Consistency));
        self.add_pass(Arc::new(Impact));
    }

    pub fn add_pass(&mut self, pass: Arc<dyn AnyEvaluationPass>) {
        self.passes.push(pass);
    }

    pub async fn evaluate(
        &self,
        ctx: &EvaluationContext,
        activity: &DeveloperActivity,
    ) -> DeveloperEvaluation {
        // 并发执行所有 pass
        let pass_futures = self.passes.iter().map(|pass| {
            let data = pass.required_data(activity);
            let name = pass.name();
            async move {
                let score = pass.apply(ctx, data.as_ref()).clamp(0.0, 100.0);
                (name, score)
            }
        });

        let scores: Vec<(&str, f64)> = join_all(pass_futures).await;
        let score_map: HashMap<&str, f64> = scores.into_iter().collect();
        let get = |name: &str| score_map.get(name).copied().unwrap_or(0.0);

        let dimensions = DimensionScores {
            code_quality: get("code_quality"),
            review_quality: get("review_quality"),
            documentation: get("documentation"),
            collaboration: get("collaboration"),
            consistency: get("consistency"),
            impact: get("impact"),
        };
        let overall: f64 = score_map
            .iter()
            .map(|(name, score)| score * ctx.weights.weight_for(name))
            .sum::<f64>()
            .clamp(0.0, 100.0);

        let domain_scores = aggregate::domain_scores(ctx, activity);
        let top_domains = aggregate::top_domains(&domain_scores);

        info!(
            "Developer {} evaluation completed - Scores: overall= {:.2}, code= {:.2}, review= {:.2}, docs= {:.2}, collab= {:.2}, consistency= {:.2}, impact= {:.2}",
            activity.developer_id,
            overall,
            dimensions.code_quality,
            dimensions.review_quality,
            dimensions.documentation,
            dimensions.collaboration,
            dimensions.consistency,
            dimensions.impact,
        );

        DeveloperEvaluation {
            scores: dimensions,
            overall,
            portfolios: aggregate::portfolios(ctx, activity),
            languages: aggregate::profile_languages(activity),
            domain_scores,
            top_domains,
        }
    }
}
