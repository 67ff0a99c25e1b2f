use std::sync::Arc;

use anyhow::Context as _;
use database::storage::Context;
use evaluate::LabelModel;
use github_handler::{GitHubClient, RateGate};
use ingestion::tasks::Services;
use ingestion::{LocalQueue, Pipeline, ProfileService, Repairer, Worker};
use search::{Embedder, MemoryVectorIndex, SearchEngine};
use tracing::info;

use crate::config::AppConfig;
use crate::services::{http_client, HttpEmbedder, HttpLabelModel};

/// Every long-lived component, built once per process.
pub struct App {
    pub config: AppConfig,
    pub store: Arc<Context>,
    pub host: Arc<GitHubClient>,
    pub gate: Arc<RateGate>,
    pub index: Arc<MemoryVectorIndex>,
    pub embedder: Arc<dyn Embedder>,
    pub queue: Arc<LocalQueue>,
    pub pipeline: Arc<Pipeline>,
}

impl App {
    pub async fn build(mut config: AppConfig) -> anyhow::Result<Self> {
        if config.github.token.is_none() {
            config.github.token = std::env::var("GITHUB_TOKEN").ok();
        }

        let store = Arc::new(Context::new(&config.database.url).await?);
        store.setup_schema().await?;

        let host = Arc::new(GitHubClient::new(config.github.clone()));
        let gate = Arc::new(RateGate::default());
        let index = Arc::new(
            MemoryVectorIndex::open_or_create(&config.services.vector_dir)
                .with_context(|| format!("open vector store {}", config.services.vector_dir.display()))?,
        );

        let client = http_client(&config.services)?;
        let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(client.clone(), &config.services));
        let label_model = config.services.chat_model.as_deref().map(|model| {
            Arc::new(HttpLabelModel::new(client.clone(), &config.services, model)) as Arc<dyn LabelModel>
        });
        info!(
            "services at {} (embedding {}, classifier {})",
            config.services.base_url,
            config.services.embedding_model,
            config.services.chat_model.as_deref().unwrap_or("heuristics only")
        );

        let queue = Arc::new(LocalQueue::new());
        let services = Services {
            host: host.clone(),
            store: store.clone(),
            queue: queue.clone(),
            embedder: embedder.clone(),
            index: index.clone(),
            label_model,
        };
        let pipeline = Arc::new(Pipeline::new(
            services,
            gate.clone(),
            config.scoring.clone(),
            config.ingestion.clone(),
        ));

        Ok(Self {
            config,
            store,
            host,
            gate,
            index,
            embedder,
            queue,
            pipeline,
        })
    }

    pub fn worker(&self) -> Worker {
        Worker::new(self.pipeline.clone(), self.queue.clone(), &self.config.ingestion)
    }

    pub fn repairer(&self) -> Repairer {
        Repairer::new(
            self.store.clone(),
            self.queue.clone(),
            self.pipeline.coordinator().locks(),
        )
    }

    pub fn search_engine(&self) -> SearchEngine {
        SearchEngine::new(
            self.index.clone(),
            self.embedder.clone(),
            self.store.clone(),
            self.config.search.clone(),
        )
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.store.clone(), self.queue.clone())
    }
}
