use crate::aggregate::DeveloperActivity;
use crate::config::EvaluationContext;
use crate::formula;
use crate::pass::{AnyEvaluationPass, PassData};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct CodeQualityData {
    /// (quality score, authored at) per scored contribution.
    pub samples: Vec<(f64, DateTime<Utc>)>,
    pub now: DateTime<Utc>,
}

impl From<&DeveloperActivity> for CodeQualityData {
    fn from(activity: &DeveloperActivity) -> Self {
        Self {
            samples: activity
                .scored()
                .map(|c| (c.quality_score.unwrap_or(0.0), c.authored_at))
                .collect(),
            now: activity.now,
        }
    }
}

/// Recency-weighted mean quality: Σ(q·d)/Σd.
pub struct CodeQuality;

impl AnyEvaluationPass for CodeQuality {
    fn apply(&self, ctx: &EvaluationContext, data: &dyn PassData) -> f64 {
        let Some(data) = data.as_any().downcast_ref::<CodeQualityData>() else {
            return 0.0;
        };
        let (mut weighted, mut weights) = (0.0, 0.0);
        for (quality, authored_at) in &data.samples {
            let d = formula::recency_factor(&ctx.formula, *authored_at, data.now);
            weighted += quality * d;
            weights += d;
        }
        if weights <= 0.0 {
            return 0.0;
        }
        (weighted / weights).clamp(0.0, 100.0)
    }

    fn required_data(&self, activity: &DeveloperActivity) -> Box<dyn PassData> {
        Box::new(CodeQualityData::from(activity))
    }

    fn name(&self) -> &'static str {
        "code_quality"
    }
}
