//! Musafir travel assistant
//!
//! Answers travel questions from city guides with support for:
//! - Keyword, dense-vector, hybrid rank-fusion and local lexical retrieval
//! - Allow-listed generation with latency and token accounting
//! - Relevance grading of every answer by a second model call

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::{AppState, StoreProbe};
use domain::knowledge_base::DocumentStore;
use domain::retrieval::{
    HybridStrategy, KeywordStrategy, LocalIndexStrategy, QueryRouter, VectorStrategy,
};
use domain::{
    AnswerPipeline, EmbeddingProvider, Generator, LlmProvider, PromptBuilder, RelevanceEvaluator,
    SearchStrategy,
};
use infrastructure::embedding::MistralEmbeddingProvider;
use infrastructure::http::HttpClient;
use infrastructure::knowledge_base::{
    ElasticsearchStore, InMemoryDocumentStore, QdrantStore, embed_missing, load_documents,
};
use infrastructure::llm::MistralProvider;
use tracing::{info, warn};

/// Create the application state from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let client = HttpClient::with_timeout(config.llm.request_timeout())?;

    let provider: Arc<dyn LlmProvider> = Arc::new(MistralProvider::with_base_url(
        client.clone(),
        read_secret(&config.llm.api_key_env),
        &config.llm.base_url,
    ));
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(
        MistralEmbeddingProvider::with_base_url(
            client.clone(),
            read_secret(&config.embedding.api_key_env),
            &config.embedding.base_url,
        )
        .with_model(&config.embedding.model),
    );

    create_app_state_with(config, client, provider, embedder).await
}

/// Create the application state around the given model backends
pub async fn create_app_state_with(
    config: &AppConfig,
    client: HttpClient,
    provider: Arc<dyn LlmProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
) -> anyhow::Result<AppState> {
    let retrieval = config.retrieval.clone();

    let local: Arc<dyn DocumentStore> =
        Arc::new(create_local_store(config, embedder.as_ref()).await?);

    let elasticsearch: Option<Arc<dyn DocumentStore>> =
        config.stores.elasticsearch.as_ref().map(|es| {
            info!(url = %es.url, index = %es.index, "Using Elasticsearch store");
            Arc::new(
                ElasticsearchStore::new(client.clone(), &es.url, &es.index)
                    .with_api_key(es.api_key_env.as_deref().and_then(optional_secret)),
            ) as Arc<dyn DocumentStore>
        });

    let qdrant: Option<Arc<dyn DocumentStore>> = config.stores.qdrant.as_ref().map(|qd| {
        info!(url = %qd.url, collection = %qd.collection, "Using Qdrant store");
        Arc::new(
            QdrantStore::new(client.clone(), &qd.url, &qd.collection)
                .with_api_key(qd.api_key_env.as_deref().and_then(optional_secret))
                .with_dense_model(Some(qd.dense_model.clone()).filter(|m| !m.is_empty())),
        ) as Arc<dyn DocumentStore>
    });

    let lexical_store = elasticsearch.clone().unwrap_or_else(|| local.clone());
    let hybrid_store = qdrant.clone().unwrap_or_else(|| local.clone());

    let router = QueryRouter::new(
        Arc::new(KeywordStrategy::new(lexical_store.clone(), retrieval.clone())),
        Arc::new(VectorStrategy::new(
            lexical_store,
            embedder.clone(),
            retrieval.clone(),
        )),
        Arc::new(HybridStrategy::new(
            hybrid_store,
            embedder.clone(),
            retrieval.clone(),
        )),
        Arc::new(LocalIndexStrategy::new(local.clone(), retrieval.clone())),
    )
    .with_default_strategy(retrieval.default_strategy);

    let generator = Generator::new(provider, config.llm.models.clone());
    let evaluator = RelevanceEvaluator::new(generator.clone(), &config.llm.evaluator_model)?
        .with_json_mode(config.llm.evaluator_json_mode);

    let pipeline = AnswerPipeline::new(router, PromptBuilder::new(), generator, evaluator)
        .with_deadline(config.pipeline.deadline());

    let default = retrieval.default_strategy;
    let mut stores = vec![StoreProbe::new(
        "local",
        local,
        default == SearchStrategy::LexicalIndexLocal
            || (elasticsearch.is_none() && default != SearchStrategy::HybridFusion)
            || (qdrant.is_none() && default == SearchStrategy::HybridFusion),
    )];
    if let Some(store) = elasticsearch {
        let required = matches!(default, SearchStrategy::Keyword | SearchStrategy::Vector);
        stores.push(StoreProbe::new("elasticsearch", store, required));
    }
    if let Some(store) = qdrant {
        stores.push(StoreProbe::new(
            "qdrant",
            store,
            default == SearchStrategy::HybridFusion,
        ));
    }

    info!(
        default_strategy = %default,
        models = ?config.llm.models.models(),
        evaluator = %config.llm.evaluator_model,
        "Answer pipeline ready"
    );

    Ok(AppState::new(Arc::new(pipeline), stores))
}

/// Build the in-memory store, loading and embedding passages when configured
async fn create_local_store(
    config: &AppConfig,
    embedder: &dyn EmbeddingProvider,
) -> anyhow::Result<InMemoryDocumentStore> {
    let store = InMemoryDocumentStore::new();

    let Some(path) = &config.stores.local.documents_path else {
        warn!("No local documents configured; the local index is empty");
        return Ok(store);
    };

    let mut documents = load_documents(path).await?;

    if config.stores.local.embed_missing {
        let mut fields = vec![config.retrieval.vector_field.as_str()];
        if config.retrieval.dense_field != config.retrieval.vector_field {
            fields.push(config.retrieval.dense_field.as_str());
        }

        for field in fields {
            let embedded = embed_missing(&mut documents, embedder, field).await?;
            info!(field, embedded, "Embedded local documents");
        }
    }

    store.add_documents(documents).await;
    Ok(store)
}

fn read_secret(env_var: &str) -> String {
    optional_secret(env_var).unwrap_or_else(|| {
        warn!(env_var, "API key not set; backend calls will be rejected");
        String::new()
    })
}

fn optional_secret(env_var: &str) -> Option<String> {
    std::env::var(env_var).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::llm::MockLlmProvider;

    fn backends() -> (HttpClient, Arc<dyn LlmProvider>, Arc<MockEmbeddingProvider>) {
        (
            HttpClient::new(),
            Arc::new(MockLlmProvider::new("mock")),
            Arc::new(MockEmbeddingProvider::new(4)),
        )
    }

    #[tokio::test]
    async fn test_default_config_uses_local_store_only() {
        let (client, provider, embedder) = backends();

        let state = create_app_state_with(&AppConfig::default(), client, provider, embedder)
            .await
            .unwrap();

        assert_eq!(state.stores.len(), 1);
        assert!(state.stores[0].required);
        assert_eq!(
            state.pipeline.router().default_strategy(),
            SearchStrategy::LexicalIndexLocal
        );
        assert_eq!(state.pipeline.deadline().as_secs(), 60);
    }

    #[tokio::test]
    async fn test_remote_stores_are_probed() {
        let (client, provider, embedder) = backends();
        let mut config = AppConfig::default();
        config.retrieval.default_strategy = SearchStrategy::HybridFusion;
        config.stores.qdrant = Some(crate::config::QdrantConfig {
            url: "http://localhost:6333".to_string(),
            collection: "musafir".to_string(),
            api_key_env: None,
            dense_model: String::new(),
        });

        let state = create_app_state_with(&config, client, provider, embedder)
            .await
            .unwrap();

        let names: Vec<(&str, bool)> = state
            .stores
            .iter()
            .map(|p| (p.name.as_str(), p.required))
            .collect();
        assert_eq!(names, vec![("local", false), ("qdrant", true)]);
    }

    #[tokio::test]
    async fn test_evaluator_model_must_be_allowed() {
        let (client, provider, embedder) = backends();
        let mut config = AppConfig::default();
        config.llm.evaluator_model = "gpt-4".to_string();

        assert!(
            create_app_state_with(&config, client, provider, embedder)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_local_documents_are_loaded_and_embedded() {
        let path = std::env::temp_dir().join(format!("musafir-lib-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(
            &path,
            r#"[{"id": "rome-1", "city": "Rome", "section": "Eat", "text": "Supplì"}]"#,
        )
        .await
        .unwrap();

        let (client, provider, embedder) = backends();
        let mut config = AppConfig::default();
        config.stores.local.documents_path = Some(path.clone());
        config.stores.local.embed_missing = true;

        let state = create_app_state_with(&config, client, provider, embedder.clone())
            .await
            .unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        // one passage, embedded for the vector field and the dense field
        assert_eq!(embedder.call_count(), 2);
        assert!(state.stores[0].store.health_check().await.unwrap());
    }
}
