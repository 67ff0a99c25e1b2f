use crate::aggregate::DeveloperActivity;
use crate::config::EvaluationContext;
use crate::pass::{AnyEvaluationPass, PassData};
use model::{Review, ReviewState};

#[derive(Debug, Clone)]
pub struct ReviewQualityData {
    pub reviews: Vec<Review>,
}

impl From<&DeveloperActivity> for ReviewQualityData {
    fn from(activity: &DeveloperActivity) -> Self {
        Self {
            reviews: activity.reviews.clone(),
        }
    }
}

/// depth = min(1, 0.4·min(1,comments/5) + 0.4·min(1,chars/500) + 0.2·codeRef)
pub fn review_depth(review: &Review) -> f64 {
    let comments = (review.comment_count.max(0) as f64 / 5.0).min(1.0);
    let chars = (review.comment_chars.max(0) as f64 / 500.0).min(1.0);
    let code_ref = if review.references_code { 1.0 } else { 0.0 };
    (0.4 * comments + 0.4 * chars + 0.2 * code_ref).min(1.0)
}

/// Zero-comment approval submitted within `threshold_secs` of the PR opening.
pub fn is_rubber_stamp(review: &Review, threshold_secs: i64) -> bool {
    if review.state != ReviewState::Approved || review.comment_count > 0 {
        return false;
    }
    match review.pr_opened_at {
        Some(opened) => (review.submitted_at - opened).num_seconds() < threshold_secs,
        None => false,
    }
}

pub type RubberStampPolicy = fn(&Review, i64) -> bool;

pub struct ReviewQuality {
    pub rubber_stamp: RubberStampPolicy,
}

impl Default for ReviewQuality {
    fn default() -> Self {
        Self {
            rubber_stamp: is_rubber_stamp,
        }
    }
}

impl AnyEvaluationPass for ReviewQuality {
    fn apply(&self, ctx: &EvaluationContext, data: &dyn PassData) -> f64 {
        let Some(data) = data.as_any().downcast_ref::<ReviewQualityData>() else {
            return 0.0;
        };
        if data.reviews.is_empty() {
            return 0.0;
        }
        let agg = &ctx.aggregation;
        let n = data.reviews.len() as f64;
        let depths: Vec<f64> = data.reviews.iter().map(review_depth).collect();

        let substantive = depths.iter().filter(|d| **d >= agg.substantive_depth).count() as f64;
        let avg_depth = depths.iter().sum::<f64>() / n;
        let change_requests = data
            .reviews
            .iter()
            .filter(|r| r.state == ReviewState::ChangesRequested)
            .count() as f64;
        let rubber_stamps = data
            .reviews
            .iter()
            .filter(|r| (self.rubber_stamp)(r, agg.rubber_stamp_secs))
            .count() as f64;

        let raw = agg.substantive_weight * (substantive / n)
            + agg.depth_weight * avg_depth
            + agg.change_request_weight * (change_requests / n)
            + agg.non_rubber_stamp_weight * (1.0 - rubber_stamps / n);
        100.0 * raw.clamp(0.0, 1.0)
    }

    fn required_data(&self, activity: &DeveloperActivity) -> Box<dyn PassData> {
        Box::new(ReviewQualityData::from(activity))
    }

    fn name(&self) -> &'static str {
        "review_quality"
    }
}
