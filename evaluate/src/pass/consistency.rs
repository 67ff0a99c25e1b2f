use crate::aggregate::DeveloperActivity;
use crate::config::EvaluationContext;
use crate::pass::{AnyEvaluationPass, PassData};
use chrono::{DateTime, Datelike, Utc};

#[derive(Debug, Clone)]
pub struct ConsistencyData {
    /// Contribution and review timestamps.
    pub activity: Vec<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

impl From<&DeveloperActivity> for ConsistencyData {
    fn from(activity: &DeveloperActivity) -> Self {
        Self {
            activity: activity
                .contributions
                .iter()
                .map(|c| c.authored_at)
                .chain(activity.reviews.iter().map(|r| r.submitted_at))
                .collect(),
            now: activity.now,
        }
    }
}

fn month_index(at: DateTime<Utc>) -> i64 {
    at.year() as i64 * 12 + at.month0() as i64
}

/// Buckets timestamps into the `months` calendar months ending at `now`;
/// index 0 is the current month.
pub fn monthly_buckets(stamps: &[DateTime<Utc>], now: DateTime<Utc>, months: usize) -> Vec<u32> {
    let mut buckets = vec![0u32; months];
    let current = month_index(now);
    for at in stamps {
        let ago = current - month_index(*at);
        if ago >= 0 && (ago as usize) < months {
            buckets[ago as usize] += 1;
        }
    }
    buckets
}

/// 100 × sqrt(activeMonths/N) / (1 + cv); an all-zero series scores 0.
pub fn consistency_score(monthly: &[u32]) -> f64 {
    if monthly.is_empty() {
        return 0.0;
    }
    let n = monthly.len() as f64;
    let mean = monthly.iter().map(|m| *m as f64).sum::<f64>() / n;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = monthly.iter().map(|m| (*m as f64 - mean).powi(2)).sum::<f64>() / n;
    let cv = variance.sqrt() / mean;
    let active = monthly.iter().filter(|m| **m > 0).count() as f64;
    (100.0 * (active / n).sqrt() / (1.0 + cv)).clamp(0.0, 100.0)
}

pub struct Consistency;

impl AnyEvaluationPass for Consistency {
    fn apply(&self, ctx: &EvaluationContext, data: &dyn PassData) -> f64 {
        let Some(data) = data.as_any().downcast_ref::<ConsistencyData>() else {
            return 0.0;
        };
        let months = ctx.aggregation.consistency_months.max(1);
        consistency_score(&monthly_buckets(&data.activity, data.now, months))
    }

    fn required_data(&self, activity: &DeveloperActivity) -> Box<dyn PassData> {
        Box::new(ConsistencyData::from(activity))
    }

    fn name(&self) -> &'static str {
        "consistency"
    }
}
