pub mod aggregate;
pub mod classify;
pub mod config;
pub mod diff;
pub mod formula;
pub mod manager;
pub mod pass;
pub mod signals;

pub use aggregate::DeveloperActivity;
pub use classify::{Classification, Classifier, LabelModel};
pub use config::{AggregationConfig, DimensionWeights, EvaluationContext, FormulaConfig};
pub use manager::{DeveloperEvaluation, EvaluationManager};
pub use pass::{score_to_grade, EvaluationGrade};
pub use signals::{extract_commit_signals, CommitSignals};
