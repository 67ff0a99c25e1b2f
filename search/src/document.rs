//! Embedding source text and vector ids for a developer's profile and portfolio.

use model::{Developer, RepoPortfolio};
use tracing::info;

use crate::embed::Embedder;
use crate::index::{VectorIndex, VectorMetadata};

pub fn profile_vector_id(developer_id: &str) -> String {
    format!("dev:{}", developer_id)
}

pub fn portfolio_vector_id(developer_id: &str, repo: &str) -> String {
    format!("repo:{}:{}", developer_id, repo)
}

pub fn profile_document(developer: &Developer) -> String {
    let s = &developer.scores;
    let mut doc = format!("Developer {}.", developer.username);
    if !developer.top_domains.is_empty() {
        doc.push_str(&format!(" Domains: {}.", developer.top_domains.join(", ")));
    }
    if !developer.languages.is_empty() {
        doc.push_str(&format!(" Languages: {}.", developer.languages.join(", ")));
    }
    doc.push_str(&format!(
        " Scores: code quality {:.0}, review quality {:.0}, documentation {:.0}, collaboration {:.0}, consistency {:.0}, impact {:.0}, overall {:.0}.",
        s.code_quality,
        s.review_quality,
        s.documentation,
        s.collaboration,
        s.consistency,
        s.impact,
        developer.overall_score,
    ));
    doc
}

pub fn portfolio_document(developer: &Developer, portfolio: &RepoPortfolio) -> String {
    format!("{} contributed to {}", developer.username, portfolio.summary)
}

pub fn profile_metadata(developer: &Developer) -> VectorMetadata {
    VectorMetadata {
        developer_id: developer.id.clone(),
        languages: developer.languages.clone(),
        domains: developer.top_domains.clone(),
    }
}

pub fn portfolio_metadata(developer: &Developer, portfolio: &RepoPortfolio) -> VectorMetadata {
    VectorMetadata {
        developer_id: developer.id.clone(),
        languages: if portfolio.languages.is_empty() {
            developer.languages.clone()
        } else {
            portfolio.languages.clone()
        },
        domains: developer.top_domains.clone(),
    }
}

/// Embeds the profile and every portfolio in one batch and upserts them.
/// Returns the number of vectors written.
pub async fn index_developer(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    developer: &Developer,
    portfolios: &[RepoPortfolio],
) -> anyhow::Result<usize> {
    let mut ids = vec![profile_vector_id(&developer.id)];
    let mut texts = vec![profile_document(developer)];
    let mut metadata = vec![profile_metadata(developer)];
    for portfolio in portfolios {
        ids.push(portfolio_vector_id(&developer.id, &portfolio.repo));
        texts.push(portfolio_document(developer, portfolio));
        metadata.push(portfolio_metadata(developer, portfolio));
    }

    let embeddings = embedder.embed_batch(&texts).await?;
    if embeddings.len() != texts.len() {
        anyhow::bail!(
            "embedding service returned {} vectors for {} documents",
            embeddings.len(),
            texts.len()
        );
    }

    let written = embeddings.len();
    for ((id, embedding), meta) in ids.iter().zip(embeddings).zip(metadata) {
        index.upsert(id, embedding, meta).await?;
    }
    info!("indexed {} vectors for {}", written, developer.id);
    Ok(written)
}
