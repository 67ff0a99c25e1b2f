use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use database::storage::RecordStore;
use model::{Developer, QualificationFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::embed::Embedder;
use crate::index::VectorIndex;
use crate::keywords::{extract_signals, QuerySignals};
use crate::rerank::{rerank, Candidate};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Vector hits fetched per requested result.
    pub overfetch_factor: usize,
    pub cold_start_base: f64,
    pub cold_start_decay: f64,
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            overfetch_factor: 8,
            cold_start_base: 0.5,
            cold_start_decay: 0.9,
            default_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub text: String,
    pub languages: Vec<String>,
    pub domains: Vec<String>,
    pub filter: QualificationFilter,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub developer_id: String,
    pub username: String,
    pub score: f64,
    pub similarity: f64,
    pub overall_score: f64,
    pub languages: Vec<String>,
    pub domains: Vec<String>,
}

pub struct SearchEngine {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn RecordStore>,
    config: SearchConfig,
}

/// Free text with the explicit filters appended, so they shape the embedding.
pub fn build_search_text(request: &SearchRequest) -> String {
    let mut text = request.text.trim().to_owned();
    if !request.languages.is_empty() {
        text.push_str(&format!(" Languages: {}.", request.languages.join(", ")));
    }
    if !request.domains.is_empty() {
        text.push_str(&format!(" Domains: {}.", request.domains.join(", ")));
    }
    text.trim().to_owned()
}

impl SearchEngine {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn RecordStore>,
        config: SearchConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            store,
            config,
        }
    }

    pub async fn search(&self, request: &SearchRequest) -> anyhow::Result<Vec<SearchHit>> {
        let limit = request.limit.unwrap_or(self.config.default_limit).max(1);
        let now = Utc::now();

        let signals = self.signals_for(request);

        let embedding = self.embedder.embed(&build_search_text(request)).await?;
        let hits = self
            .index
            .query(&embedding, limit * self.config.overfetch_factor)
            .await?;
        if hits.is_empty() {
            info!("no vector hits for {:?}, using cold start", request.text);
            return self.cold_start(&request.filter, limit).await;
        }

        // one candidate per developer, best similarity wins, attributes unioned
        let mut candidates: HashMap<String, Candidate> = HashMap::new();
        for hit in hits {
            let entry = candidates
                .entry(hit.metadata.developer_id.clone())
                .or_insert_with(|| Candidate {
                    developer_id: hit.metadata.developer_id.clone(),
                    similarity: f64::MIN,
                    languages: Vec::new(),
                    domains: Vec::new(),
                });
            entry.similarity = entry.similarity.max(hit.score as f64);
            for lang in hit.metadata.languages {
                if !entry.languages.contains(&lang) {
                    entry.languages.push(lang);
                }
            }
            for domain in hit.metadata.domains {
                if !entry.domains.contains(&domain) {
                    entry.domains.push(domain);
                }
            }
        }
        debug!("{} candidates after dedup, signals {:?}", candidates.len(), signals);

        let ranked = rerank(&signals, candidates.into_values().collect());
        let ids: Vec<String> = ranked.iter().map(|(c, _)| c.developer_id.clone()).collect();
        let qualified: HashMap<String, Developer> = self
            .store
            .qualified_developers(&ids, &request.filter, now)
            .await?
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();

        let results: Vec<SearchHit> = ranked
            .into_iter()
            .filter_map(|(candidate, score)| {
                let developer = qualified.get(&candidate.developer_id)?;
                Some(to_hit(developer, score, candidate.similarity))
            })
            .take(limit)
            .collect();
        info!("search {:?} returned {} results", request.text, results.len());
        Ok(results)
    }

    /// Top developers by overall score with a synthetic decaying similarity.
    async fn cold_start(
        &self,
        filter: &QualificationFilter,
        limit: usize,
    ) -> anyhow::Result<Vec<SearchHit>> {
        let developers = self.store.top_developers(filter, limit, Utc::now()).await?;
        Ok(developers
            .iter()
            .enumerate()
            .map(|(rank, developer)| {
                let similarity =
                    self.config.cold_start_base * self.config.cold_start_decay.powi(rank as i32);
                to_hit(developer, similarity, similarity)
            })
            .collect())
    }

    pub fn signals_for(&self, request: &SearchRequest) -> QuerySignals {
        let mut signals = extract_signals(&request.text);
        signals.extend_explicit(&request.languages, &request.domains);
        signals
    }
}

fn to_hit(developer: &Developer, score: f64, similarity: f64) -> SearchHit {
    SearchHit {
        developer_id: developer.id.clone(),
        username: developer.username.clone(),
        score,
        similarity,
        overall_score: developer.overall_score,
        languages: developer.languages.clone(),
        domains: developer.top_domains.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_search_text() {
        let request = SearchRequest {
            text: "  payments engineer ".to_owned(),
            languages: vec!["go".to_owned()],
            domains: vec!["backend".to_owned()],
            ..Default::default()
        };
        assert_eq!(
            build_search_text(&request),
            "payments engineer Languages: go. Domains: backend."
        );
    }

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.overfetch_factor, 8);
        assert_eq!(config.cold_start_base, 0.5);
    }
}
