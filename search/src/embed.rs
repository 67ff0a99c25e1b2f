use anyhow::Context;
use async_trait::async_trait;

/// Opaque text embedding service.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_owned()])
            .await?
            .into_iter()
            .next()
            .context("No embedding returned")
    }
}
