use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use evaluate::EvaluationContext;
use github_handler::GitHubConfig;
use ingestion::IngestionConfig;
use search::SearchConfig;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://devrank.db?mode=rwc".to_owned(),
        }
    }
}

/// OpenAI-compatible embedding and chat endpoints.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServicesConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub embedding_model: String,
    /// `None` keeps classification on heuristics only.
    pub chat_model: Option<String>,
    pub vector_dir: PathBuf,
    pub timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_owned(),
            api_key: None,
            embedding_model: "nomic-embed-text".to_owned(),
            chat_model: None,
            vector_dir: PathBuf::from("data/vectors"),
            timeout_secs: 60,
        }
    }
}

/// 应用配置 (everything the binary wires together)
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
    pub services: ServicesConfig,
    pub ingestion: IngestionConfig,
    pub search: SearchConfig,
    pub scoring: EvaluationContext,
}

impl AppConfig {
    /// TOML file (optional) overlaid with `DEVRANK_*` environment variables.
    pub fn load_config(config_path: &str) -> anyhow::Result<Self> {
        let config: AppConfig = Config::builder()
            .add_source(
                File::with_name(config_path)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("DEVRANK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| anyhow::anyhow!("Failed to load config"))?
            .try_deserialize()
            .with_context(|| anyhow::anyhow!("Failed to deserialize config"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("database.url must be set");
        }
        if self.search.overfetch_factor == 0 || self.search.default_limit == 0 {
            anyhow::bail!("search.overfetch_factor and search.default_limit must be positive");
        }
        self.ingestion.validate().context("invalid [ingestion]")?;
        self.scoring.validate().context("invalid [scoring]")?;
        Ok(())
    }
}
