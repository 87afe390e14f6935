use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::evaluation::DEFAULT_EVALUATOR_MODEL;
use crate::domain::{ModelAllowList, RetrievalConfig};
use crate::infrastructure::embedding::DEFAULT_EMBEDDING_MODEL;
use crate::infrastructure::knowledge_base::DEFAULT_DENSE_MODEL;
use crate::infrastructure::llm::DEFAULT_MISTRAL_BASE_URL;
use crate::infrastructure::observability::MetricsConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub stores: StoresConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Chat completion backend
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Models callers may choose from
    pub models: ModelAllowList,
    pub evaluator_model: String,
    /// Ask the backend for a JSON object when grading
    pub evaluator_json_mode: bool,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub model: String,
}

/// Document stores; a strategy whose store is not configured falls back to
/// the local store
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoresConfig {
    pub elasticsearch: Option<ElasticsearchConfig>,
    pub qdrant: Option<QdrantConfig>,
    pub local: LocalStoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElasticsearchConfig {
    pub url: String,
    #[serde(default = "default_es_index")]
    pub index: String,
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QdrantConfig {
    pub url: String,
    #[serde(default = "default_qdrant_collection")]
    pub collection: String,
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Model Qdrant uses to embed query text for the dense prefetch; empty
    /// means the configured embedder produces the query vector instead
    #[serde(default = "default_qdrant_dense_model")]
    pub dense_model: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocalStoreConfig {
    /// JSON file of passages loaded at startup
    pub documents_path: Option<PathBuf>,
    /// Embed passages that ship without vectors
    pub embed_missing: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub deadline_secs: u64,
}

fn default_es_index() -> String {
    "musafir".to_string()
}

fn default_qdrant_collection() -> String {
    "musafir".to_string()
}

fn default_qdrant_dense_model() -> String {
    DEFAULT_DENSE_MODEL.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MISTRAL_BASE_URL.to_string(),
            api_key_env: "MISTRAL_API_KEY".to_string(),
            models: ModelAllowList::default(),
            evaluator_model: DEFAULT_EVALUATOR_MODEL.to_string(),
            evaluator_json_mode: false,
            request_timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MISTRAL_BASE_URL.to_string(),
            api_key_env: "MISTRAL_API_KEY".to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { deadline_secs: 60 }
    }
}

impl PipelineConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("llm.models")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that deserialization cannot express
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.retrieval
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))
    }
}
