use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Attributes stored next to every vector, used for dedup and rescoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorMetadata {
    pub developer_id: String,
    pub languages: Vec<String>,
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
    pub id: String,
    pub score: f32,
    pub metadata: VectorMetadata,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace the vector stored under `id`.
    async fn upsert(&self, id: &str, embedding: Vec<f32>, metadata: VectorMetadata) -> Result<()>;

    /// Nearest `top_k` vectors by cosine similarity, best first.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<VectorHit>>;

    /// Drops every vector whose metadata points at `developer_id`.
    async fn remove_developer(&self, developer_id: &str) -> Result<usize>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorEntry {
    embedding: Vec<f32>,
    metadata: VectorMetadata,
}

/// In-memory vector store with optional disk persistence and cosine similarity search.
pub struct MemoryVectorIndex {
    entries: RwLock<BTreeMap<String, VectorEntry>>,
    persist_path: Option<PathBuf>,
}

impl Default for MemoryVectorIndex {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl MemoryVectorIndex {
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            persist_path: None,
        }
    }

    pub fn open_or_create(vector_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(vector_dir)?;
        let persist_path = vector_dir.join("vectors.json");

        let entries = if persist_path.exists() {
            let data = std::fs::read_to_string(&persist_path)
                .context("Failed to read vector store")?;
            serde_json::from_str(&data).context("Failed to parse vector store")?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            persist_path: Some(persist_path),
        })
    }

    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }

    fn persist(&self, entries: &BTreeMap<String, VectorEntry>) -> Result<()> {
        if let Some(path) = &self.persist_path {
            let data = serde_json::to_string(entries)?;
            std::fs::write(path, data)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, id: &str, embedding: Vec<f32>, metadata: VectorMetadata) -> Result<()> {
        let mut entries = self.entries.write();
        entries.insert(id.to_owned(), VectorEntry { embedding, metadata });
        self.persist(&entries)
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<VectorHit>> {
        let entries = self.entries.read();
        let mut scored: Vec<(f32, &String, &VectorEntry)> = entries
            .iter()
            .map(|(id, e)| (cosine_similarity(embedding, &e.embedding), id, e))
            .collect();

        // Sort descending by score
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(b.1))
        });
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, id, e)| VectorHit {
                id: id.clone(),
                score,
                metadata: e.metadata.clone(),
            })
            .collect())
    }

    async fn remove_developer(&self, developer_id: &str) -> Result<usize> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.metadata.developer_id != developer_id);
        let removed = before - entries.len();
        if removed > 0 {
            self.persist(&entries)?;
        }
        Ok(removed)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(dev: &str) -> VectorMetadata {
        VectorMetadata {
            developer_id: dev.to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_query_ranks() {
        let index = MemoryVectorIndex::in_memory();
        index.upsert("dev:a", vec![1.0, 0.0], meta("a")).await.unwrap();
        index.upsert("dev:b", vec![0.6, 0.8], meta("b")).await.unwrap();
        index.upsert("dev:a", vec![0.0, 1.0], meta("a")).await.unwrap();
        assert_eq!(index.entry_count(), 2);

        let hits = index.query(&[0.0, 1.0], 5).await.unwrap();
        assert_eq!(hits[0].id, "dev:a");
        assert_eq!(hits[1].id, "dev:b");
        assert_eq!(index.query(&[0.0, 1.0], 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = MemoryVectorIndex::open_or_create(dir.path()).unwrap();
            index.upsert("dev:a", vec![1.0, 2.0], meta("a")).await.unwrap();
            index.upsert("repo:a:x/y", vec![2.0, 1.0], meta("a")).await.unwrap();
            index.upsert("dev:b", vec![1.0, 1.0], meta("b")).await.unwrap();
            assert_eq!(index.remove_developer("b").await.unwrap(), 1);
        }
        let reopened = MemoryVectorIndex::open_or_create(dir.path()).unwrap();
        assert_eq!(reopened.entry_count(), 2);
    }
}
