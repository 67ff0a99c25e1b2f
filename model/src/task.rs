use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Typed unit of pipeline work carried by the task queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    Ingest {
        username: String,
    },
    AnalyzeRepo {
        developer_id: String,
        run_id: Uuid,
        repo: String,
    },
    AnalyzeReviews {
        developer_id: String,
        run_id: Uuid,
        repo: String,
    },
    ComputeScores {
        developer_id: String,
    },
    BuildVectors {
        developer_id: String,
    },
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::Ingest { .. } => "ingest",
            Task::AnalyzeRepo { .. } => "analyze_repo",
            Task::AnalyzeReviews { .. } => "analyze_reviews",
            Task::ComputeScores { .. } => "compute_scores",
            Task::BuildVectors { .. } => "build_vectors",
        }
    }

    pub fn developer_key(&self) -> String {
        match self {
            Task::Ingest { username } => crate::Developer::normalize_id(username),
            Task::AnalyzeRepo { developer_id, .. }
            | Task::AnalyzeReviews { developer_id, .. }
            | Task::ComputeScores { developer_id }
            | Task::BuildVectors { developer_id } => developer_id.clone(),
        }
    }
}
