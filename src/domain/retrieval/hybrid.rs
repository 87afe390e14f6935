//! Hybrid dense + sparse retrieval fused with reciprocal rank fusion

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::config::RetrievalConfig;
use super::strategy::{RetrievalResult, RetrievalStrategy, SearchStrategy};
use crate::domain::DomainError;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::knowledge_base::{
    DenseSpec, DocumentFilter, DocumentStore, HybridQuery, SparseSpec,
};

/// Runs a dense and a BM25 query, each fetching `fan_out` candidates, and
/// fuses them with RRF
///
/// The store owns the fusion step, either natively or through
/// [`reciprocal_rank_fusion`](super::reciprocal_rank_fusion), and returns hits
/// in fused order.
#[derive(Debug)]
pub struct HybridStrategy {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl HybridStrategy {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }
}

#[async_trait]
impl RetrievalStrategy for HybridStrategy {
    fn kind(&self) -> SearchStrategy {
        SearchStrategy::HybridFusion
    }

    async fn retrieve(
        &self,
        query: &str,
        city: Option<&str>,
    ) -> Result<RetrievalResult, DomainError> {
        let filter = DocumentFilter::from_city(city);
        let vector = if self.store.embeds_query_text() {
            None
        } else {
            Some(self.embedder.embed(query).await?)
        };

        let hybrid = HybridQuery {
            dense: DenseSpec {
                field: self.config.dense_field.clone(),
                vector,
                num_candidates: self.config.num_candidates,
            },
            sparse: SparseSpec {
                field: self.config.sparse_field.clone(),
                text: query.to_string(),
            },
            filter: filter.clone(),
            fan_out: self.config.fan_out(),
            limit: self.config.result_cap,
            rrf_k: self.config.rrf_k,
        };

        debug!(
            store = self.store.store_name(),
            fan_out = hybrid.fan_out,
            rrf_k = hybrid.rrf_k,
            "Running hybrid search"
        );

        let hits = self.store.search_hybrid(hybrid).await?;

        Ok(RetrievalResult::from_hits(
            hits,
            &filter,
            self.config.result_cap,
        ))
    }
}
