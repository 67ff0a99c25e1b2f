use crate::aggregate::{log_norm, DeveloperActivity};
use crate::config::EvaluationContext;
use crate::formula;
use crate::pass::{AnyEvaluationPass, PassData};
use chrono::{DateTime, Utc};
use model::ContributionType;

#[derive(Debug, Clone)]
pub struct DocumentationData {
    /// (churn, authored at) per docs contribution.
    pub samples: Vec<(i64, DateTime<Utc>)>,
    pub now: DateTime<Utc>,
}

impl From<&DeveloperActivity> for DocumentationData {
    fn from(activity: &DeveloperActivity) -> Self {
        Self {
            samples: activity
                .contributions
                .iter()
                .filter(|c| c.contribution_type == Some(ContributionType::Docs))
                .map(|c| (c.churn, c.authored_at))
                .collect(),
            now: activity.now,
        }
    }
}

pub struct Documentation;

impl AnyEvaluationPass for Documentation {
    fn apply(&self, ctx: &EvaluationContext, data: &dyn PassData) -> f64 {
        let Some(data) = data.as_any().downcast_ref::<DocumentationData>() else {
            return 0.0;
        };
        let volume: f64 = data
            .samples
            .iter()
            .filter(|(churn, _)| *churn >= ctx.aggregation.min_doc_churn)
            .map(|(churn, at)| *churn as f64 * formula::recency_factor(&ctx.formula, *at, data.now))
            .sum();
        log_norm(volume, ctx.aggregation.documentation_ref) * 100.0
    }

    fn required_data(&self, activity: &DeveloperActivity) -> Box<dyn PassData> {
        Box::new(DocumentationData::from(activity))
    }

    fn name(&self) -> &'static str {
        "documentation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::now;

    #[test]
    fn test_trivial_doc_edits_do_not_count() {
        let ctx = EvaluationContext::default();
        let typos = DocumentationData {
            samples: vec![(2, now()); 50],
            now: now(),
        };
        assert_eq!(Documentation.apply(&ctx, &typos), 0.0);
    }

    #[test]
    fn test_documentation_is_bounded() {
        let ctx = EvaluationContext::default();
        let some = DocumentationData { samples: vec![(400, now())], now: now() };
        let lots = DocumentationData { samples: vec![(400, now()); 100], now: now() };
        let a = Documentation.apply(&ctx, &some);
        let b = Documentation.apply(&ctx, &lots);
        assert!(a > 0.0 && a < b);
        assert_eq!(b, 100.0);
    }
}
