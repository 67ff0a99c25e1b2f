use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    #[default]
    Pending,
    InProgress,
    Complete,
    Failed,
}

impl IngestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionStatus::Pending => "pending",
            IngestionStatus::InProgress => "in_progress",
            IngestionStatus::Complete => "complete",
            IngestionStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(IngestionStatus::Pending),
            "in_progress" => Some(IngestionStatus::InProgress),
            "complete" => Some(IngestionStatus::Complete),
            "failed" => Some(IngestionStatus::Failed),
            _ => None,
        }
    }
}

/// The six 0-100 dimensions rolled into the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionScores {
    pub code_quality: f64,
    pub review_quality: f64,
    pub documentation: f64,
    pub collaboration: f64,
    pub consistency: f64,
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Developer {
    /// Normalized (lowercase) login.
    pub id: String,
    pub username: String,
    pub github_id: Option<i64>,
    pub status: IngestionStatus,
    /// Incremental-fetch watermark, only advanced when a run completes.
    pub last_ingested_at: Option<DateTime<Utc>>,
    pub attempt_count: i32,
    pub failure_reason: Option<String>,
    pub scores: DimensionScores,
    pub overall_score: f64,
    pub score_version: Option<i32>,
    pub scored_at: Option<DateTime<Utc>>,
    pub opted_out: bool,
    pub languages: Vec<String>,
    pub top_domains: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Developer {
    pub fn normalize_id(username: &str) -> String {
        username.trim().to_lowercase()
    }

    pub fn new(username: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Self::normalize_id(username),
            username: username.trim().to_owned(),
            github_id: None,
            status: IngestionStatus::Pending,
            last_ingested_at: None,
            attempt_count: 0,
            failure_reason: None,
            scores: DimensionScores::default(),
            overall_score: 0.0,
            score_version: None,
            scored_at: None,
            opted_out: false,
            languages: Vec::new(),
            top_domains: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_scores(&self) -> bool {
        self.scored_at.is_some()
    }

    /// pending/complete/failed -> in_progress. Returns false if a run is already in flight.
    pub fn begin_ingestion(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == IngestionStatus::InProgress {
            return false;
        }
        self.status = IngestionStatus::InProgress;
        self.attempt_count += 1;
        self.failure_reason = None;
        self.updated_at = now;
        true
    }

    /// in_progress -> complete, advancing the watermark to the run start.
    pub fn mark_complete(&mut self, watermark: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if self.status != IngestionStatus::InProgress {
            return false;
        }
        self.status = IngestionStatus::Complete;
        self.last_ingested_at = Some(watermark);
        self.updated_at = now;
        true
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>, now: DateTime<Utc>) -> bool {
        if self.status != IngestionStatus::InProgress {
            return false;
        }
        self.status = IngestionStatus::Failed;
        self.failure_reason = Some(reason.into());
        self.updated_at = now;
        true
    }

    /// Explicit administrative reset; the only backwards transition.
    pub fn reset_pending(&mut self, now: DateTime<Utc>) {
        self.status = IngestionStatus::Pending;
        self.last_ingested_at = None;
        self.failure_reason = None;
        self.scores = DimensionScores::default();
        self.overall_score = 0.0;
        self.score_version = None;
        self.scored_at = None;
        self.languages.clear();
        self.top_domains.clear();
        self.updated_at = now;
    }

    pub fn stuck_since(&self, stale_after: Duration, now: DateTime<Utc>) -> bool {
        self.status == IngestionStatus::InProgress && now - self.updated_at >= stale_after
    }
}

/// Durable fan-out/fan-in bookkeeping for a developer's current ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionRun {
    pub developer_id: String,
    pub run_id: Uuid,
    pub dispatched: i32,
    pub completed_units: BTreeSet<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl IngestionRun {
    pub fn start(developer_id: &str, dispatched: i32, now: DateTime<Utc>) -> Self {
        Self {
            developer_id: developer_id.to_owned(),
            run_id: Uuid::new_v4(),
            dispatched,
            completed_units: BTreeSet::new(),
            started_at: now,
            finished_at: None,
        }
    }

    /// Records one unit; duplicate reports for the same unit count once.
    pub fn record_completion(&mut self, unit: &str) -> bool {
        self.completed_units.insert(unit.to_owned())
    }

    pub fn completed(&self) -> i32 {
        self.completed_units.len() as i32
    }

    pub fn is_done(&self) -> bool {
        self.dispatched > 0 && self.completed() >= self.dispatched
    }
}

/// Gate every search result must pass against the authoritative store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualificationFilter {
    pub min_quality: Option<f64>,
    pub min_review_quality: Option<f64>,
    pub ingested_within_days: Option<i64>,
}

impl QualificationFilter {
    pub fn admits(&self, developer: &Developer, now: DateTime<Utc>) -> bool {
        if developer.opted_out
            || developer.status != IngestionStatus::Complete
            || developer.overall_score <= 0.0
        {
            return false;
        }
        if let Some(min) = self.min_quality {
            if developer.scores.code_quality < min {
                return false;
            }
        }
        if let Some(min) = self.min_review_quality {
            if developer.scores.review_quality < min {
                return false;
            }
        }
        if let Some(days) = self.ingested_within_days {
            match developer.last_ingested_at {
                Some(at) if now - at <= Duration::days(days) => {}
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let now = Utc::now();
        let mut dev = Developer::new("Octo", now);
        assert_eq!(dev.id, "octo");
        assert!(dev.begin_ingestion(now));
        assert!(!dev.begin_ingestion(now));
        assert_eq!(dev.attempt_count, 1);
        assert!(dev.last_ingested_at.is_none());
        assert!(dev.mark_complete(now, now));
        assert!(!dev.mark_complete(now, now));
        assert_eq!(dev.last_ingested_at, Some(now));
    }

    #[test]
    fn test_run_counts_duplicates_once() {
        let mut run = IngestionRun::start("octo", 2, Utc::now());
        assert!(run.record_completion("a/one"));
        assert!(!run.record_completion("a/one"));
        assert!(!run.is_done());
        run.record_completion("a/two");
        assert!(run.is_done());
    }

    #[test]
    fn test_filter_rejects_incomplete_and_opted_out() {
        let now = Utc::now();
        let mut dev = Developer::new("octo", now);
        dev.overall_score = 40.0;
        let filter = QualificationFilter::default();
        assert!(!filter.admits(&dev, now));
        dev.status = IngestionStatus::Complete;
        dev.last_ingested_at = Some(now - Duration::days(10));
        assert!(filter.admits(&dev, now));
        let recent = QualificationFilter {
            ingested_within_days: Some(5),
            ..Default::default()
        };
        assert!(!recent.admits(&dev, now));
        dev.opted_out = true;
        assert!(!filter.admits(&dev, now));
    }
}
