//! OpenAI-compatible adapters for the embedding and label-model contracts.

use anyhow::{Context, Result};
use async_trait::async_trait;
use evaluate::LabelModel;
use search::Embedder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ServicesConfig;

const EMBED_BATCH: usize = 64;

pub fn http_client(config: &ServicesConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build service http client")
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpEmbedder {
    pub fn new(client: reqwest::Client, config: &ServicesConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.embedding_model.clone(),
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(EMBED_BATCH) {
            let mut req = self.client.post(&url).json(&EmbedRequest {
                model: &self.model,
                input: chunk,
            });
            if let Some(key) = &self.api_key {
                req = req.bearer_auth(key);
            }
            let resp = req.send().await.context("Failed to call embed API")?;
            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("embed API returned {status}: {body}");
            }
            let body: EmbedResponse = resp
                .json()
                .await
                .context("Failed to parse embed response")?;
            if body.data.len() != chunk.len() {
                anyhow::bail!(
                    "embed API returned {} vectors for {} inputs",
                    body.data.len(),
                    chunk.len()
                );
            }
            all_embeddings.extend(body.data.into_iter().map(|d| d.embedding));
        }

        Ok(all_embeddings)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

fn first_answer(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .context("chat API returned no choices")
}

/// Chat-completions model answering the classifier prompt.
pub struct HttpLabelModel {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpLabelModel {
    pub fn new(client: reqwest::Client, config: &ServicesConfig, model: &str) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: model.to_owned(),
        }
    }
}

#[async_trait]
impl LabelModel for HttpLabelModel {
    async fn classify(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut req = self.client.post(&url).json(&ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system".to_owned(),
                    content: "You label source code commits. Answer only in the requested format."
                        .to_owned(),
                },
                Message {
                    role: "user".to_owned(),
                    content: prompt.to_owned(),
                },
            ],
            temperature: 0.0,
        });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.context("Failed to call chat API")?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("chat API returned {status}: {body}");
        }
        let body: ChatResponse = resp.json().await.context("Failed to parse chat response")?;
        first_answer(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_response_shape() {
        let body: EmbedResponse = serde_json::from_str(
            r#"{"object":"list","data":[{"index":0,"embedding":[0.5,-1.0]}],"model":"m"}"#,
        )
        .unwrap();
        assert_eq!(body.data[0].embedding, vec![0.5, -1.0]);
    }

    #[test]
    fn test_first_answer() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"type: bugfix\ndomains: backend"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_answer(body).unwrap(), "type: bugfix\ndomains: backend");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(first_answer(empty).is_err());
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let config = ServicesConfig {
            base_url: "http://localhost:8080/".to_owned(),
            ..Default::default()
        };
        let embedder = HttpEmbedder::new(http_client(&config).unwrap(), &config);
        assert_eq!(embedder.base_url, "http://localhost:8080");
    }
}
