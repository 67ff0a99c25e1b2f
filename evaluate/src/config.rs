use serde::Deserialize;

/// 贡献评分公式系数 (per-contribution formula coefficients)
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FormulaConfig {
    pub file_coeff: f64,
    pub entropy_coeff: f64,
    pub complexity_coeff: f64,
    pub centrality_coeff: f64,
    pub quality_base: f64,
    pub maintainability_weight: f64,
    pub test_weight: f64,
    pub quality_min: f64,
    pub quality_max: f64,
    /// ValueH that maps to a quality score of 100.
    pub reference_value: f64,
    /// Monthly decay rate for recency weighting.
    pub recency_lambda: f64,
}

impl Default for FormulaConfig {
    fn default() -> Self {
        Self {
            file_coeff: 0.15,
            entropy_coeff: 0.25,
            complexity_coeff: 0.02,
            centrality_coeff: 0.5,
            quality_base: 0.5,
            maintainability_weight: 0.3,
            test_weight: 0.4,
            quality_min: 0.2,
            quality_max: 1.2,
            reference_value: 60.0,
            recency_lambda: 0.03,
        }
    }
}

/// 聚合参数 (aggregation references and review-quality weights)
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AggregationConfig {
    pub domain_ref: f64,
    pub documentation_ref: f64,
    pub min_doc_churn: i64,
    pub impact_ref: f64,
    pub evidence_repos: usize,

    pub substantive_depth: f64,
    pub rubber_stamp_secs: i64,
    pub substantive_weight: f64,
    pub depth_weight: f64,
    pub change_request_weight: f64,
    pub non_rubber_stamp_weight: f64,

    pub collaboration_repo_ref: f64,
    pub collaboration_org_ref: f64,
    pub collaboration_peer_ref: f64,

    pub consistency_months: usize,
    pub recent_days: i64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            domain_ref: 2000.0,
            documentation_ref: 5000.0,
            min_doc_churn: 10,
            impact_ref: 10.0,
            evidence_repos: 5,
            substantive_depth: 0.3,
            rubber_stamp_secs: 300,
            substantive_weight: 0.3,
            depth_weight: 0.3,
            change_request_weight: 0.2,
            non_rubber_stamp_weight: 0.2,
            collaboration_repo_ref: 20.0,
            collaboration_org_ref: 8.0,
            collaboration_peer_ref: 25.0,
            consistency_months: 24,
            recent_days: 90,
        }
    }
}

/// 评价算法权重配置
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DimensionWeights {
    pub code_quality: f64,
    pub review_quality: f64,
    pub documentation: f64,
    pub collaboration: f64,
    pub consistency: f64,
    pub impact: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            code_quality: 0.30,
            review_quality: 0.20,
            documentation: 0.10,
            collaboration: 0.15,
            consistency: 0.10,
            impact: 0.15,
        }
    }
}

impl DimensionWeights {
    pub fn weight_for(&self, pass_name: &str) -> f64 {
        match pass_name {
            "code_quality" => self.code_quality,
            "review_quality" => self.review_quality,
            "documentation" => self.documentation,
            "collaboration" => self.collaboration,
            "consistency" => self.consistency,
            "impact" => self.impact,
            _ => 0.0,
        }
    }

    pub fn total(&self) -> f64 {
        self.code_quality
            + self.review_quality
            + self.documentation
            + self.collaboration
            + self.consistency
            + self.impact
    }
}

/// 评价上下文结构体
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct EvaluationContext {
    pub formula: FormulaConfig,
    pub aggregation: AggregationConfig,
    pub weights: DimensionWeights,
}

impl EvaluationContext {
    pub fn validate(&self) -> anyhow::Result<()> {
        let total = self.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            anyhow::bail!("dimension weights must sum to 1.0, got {}", total);
        }
        let f = &self.formula;
        if f.quality_min > f.quality_max {
            anyhow::bail!(
                "quality_min ({}) must not exceed quality_max ({})",
                f.quality_min,
                f.quality_max
            );
        }
        for (name, value) in [
            ("reference_value", f.reference_value),
            ("domain_ref", self.aggregation.domain_ref),
            ("documentation_ref", self.aggregation.documentation_ref),
            ("impact_ref", self.aggregation.impact_ref),
        ] {
            if value <= 0.0 {
                anyhow::bail!("{} must be positive, got {}", name, value);
            }
        }
        Ok(())
    }
}
