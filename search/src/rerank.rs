use std::collections::BTreeSet;

use crate::keywords::QuerySignals;

/// Weight given to vector similarity once keyword signals exist.
pub const SIMILARITY_WEIGHT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub developer_id: String,
    pub similarity: f64,
    pub languages: Vec<String>,
    pub domains: Vec<String>,
}

/// |query ∩ candidate| / |query|; 0 for an empty query set.
pub fn overlap_fraction(query: &BTreeSet<String>, candidate: &[String]) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let candidate: BTreeSet<String> = candidate.iter().map(|c| c.to_lowercase()).collect();
    query.intersection(&candidate).count() as f64 / query.len() as f64
}

pub fn blend(signals: &QuerySignals, candidate: &Candidate) -> f64 {
    if signals.is_empty() {
        return candidate.similarity;
    }
    let attribute = overlap_fraction(&signals.domains, &candidate.domains)
        .max(overlap_fraction(&signals.languages, &candidate.languages));
    SIMILARITY_WEIGHT * candidate.similarity + (1.0 - SIMILARITY_WEIGHT) * attribute
}

/// Rescores and orders candidates, best first. Ties fall back to similarity
/// and then developer id so the order is deterministic.
pub fn rerank(signals: &QuerySignals, candidates: Vec<Candidate>) -> Vec<(Candidate, f64)> {
    let mut scored: Vec<(Candidate, f64)> = candidates
        .into_iter()
        .map(|c| {
            let score = blend(signals, &c);
            (c, score)
        })
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.0.similarity
                    .partial_cmp(&a.0.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.0.developer_id.cmp(&b.0.developer_id))
    });
    scored
}
