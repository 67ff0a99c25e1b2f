pub mod code_quality;
pub mod collaboration;
pub mod consistency;
pub mod documentation;
pub mod impact;
pub mod review_quality;

use crate::aggregate::DeveloperActivity;
use crate::config::EvaluationContext;
use std::any::Any;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationGrade {
    A, // 90-100
    B, // 80-89
    C, // 60-79
    D, // 0-59
}

impl EvaluationGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationGrade::A => "A",
            EvaluationGrade::B => "B",
            EvaluationGrade::C => "C",
            EvaluationGrade::D => "D",
        }
    }
}

/// 将分数转换为等级
pub fn score_to_grade(score: f64) -> EvaluationGrade {
    match score {
        s if s >= 90.0 => EvaluationGrade::A,
        s if s >= 80.0 => EvaluationGrade::B,
        s if s >= 60.0 => EvaluationGrade::C,
        _ => EvaluationGrade::D,
    }
}

pub trait PassData: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> PassData for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One scoring dimension. `apply` returns the unweighted 0-100 score; the
/// manager applies the configured weight.
pub trait AnyEvaluationPass: Send + Sync {
    fn apply(&self, ctx: &EvaluationContext, data: &dyn PassData) -> f64;
    fn required_data(&self, activity: &DeveloperActivity) -> Box<dyn PassData>;
    fn name(&self) -> &'static str;
}
