//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, ElasticsearchConfig, EmbeddingConfig, LlmConfig, LocalStoreConfig, LogFormat,
    LoggingConfig, PipelineConfig, QdrantConfig, ServerConfig, StoresConfig,
};
