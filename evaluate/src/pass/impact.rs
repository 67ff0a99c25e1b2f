use crate::aggregate::{log_norm, DeveloperActivity};
use crate::config::EvaluationContext;
use crate::formula;
use crate::pass::{AnyEvaluationPass, PassData};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct ImpactData {
    /// (repo centrality, contribution count) per repo.
    pub repos: Vec<(f64, usize)>,
}

impl From<&DeveloperActivity> for ImpactData {
    fn from(activity: &DeveloperActivity) -> Self {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for c in &activity.contributions {
            *counts.entry(c.repo.as_str()).or_insert(0) += 1;
        }
        Self {
            repos: counts
                .into_iter()
                .map(|(repo, count)| {
                    let centrality = activity
                        .repo(repo)
                        .map_or(0.0, |m| formula::centrality(m.stars, m.contributors));
                    (centrality, count)
                })
                .collect(),
        }
    }
}

/// Log-normalized Σ centrality·ln(1+count) over repos.
pub struct Impact;

impl AnyEvaluationPass for Impact {
    fn apply(&self, ctx: &EvaluationContext, data: &dyn PassData) -> f64 {
        let Some(data) = data.as_any().downcast_ref::<ImpactData>() else {
            return 0.0;
        };
        let reach: f64 = data
            .repos
            .iter()
            .map(|(centrality, count)| centrality * (*count as f64).ln_1p())
            .sum();
        log_norm(reach, ctx.aggregation.impact_ref) * 100.0
    }

    fn required_data(&self, activity: &DeveloperActivity) -> Box<dyn PassData> {
        Box::new(ImpactData::from(activity))
    }

    fn name(&self) -> &'static str {
        "impact"
    }
}
