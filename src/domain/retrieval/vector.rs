//! Dense-vector retrieval blended with a lexical signal

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::config::RetrievalConfig;
use super::strategy::{RetrievalResult, RetrievalStrategy, SearchStrategy, sort_by_score};
use crate::domain::DomainError;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::knowledge_base::{
    DocumentField, DocumentFilter, DocumentStore, FieldBoost, KeywordQuery, MatchType,
    VectorQuery,
};

/// Boost on the city field of the lexical clause
const CITY_FIELD_BOOST: f64 = 3.0;

/// Minimum candidate pool per returned document
const CANDIDATES_PER_RESULT: usize = 1000;

/// Embeds the query, then runs a nearest-neighbour search whose score is added
/// to a boosted multi-field lexical score
#[derive(Debug)]
pub struct VectorStrategy {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl VectorStrategy {
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

    fn build_query(&self, text: &str, vector: Vec<f32>, filter: &DocumentFilter) -> VectorQuery {
        let cap = self.config.result_cap;
        let lexical = KeywordQuery::new(text)
            .with_fields(vec![
                FieldBoost::new(DocumentField::City, CITY_FIELD_BOOST),
                FieldBoost::unboosted(DocumentField::Section),
                FieldBoost::unboosted(DocumentField::Subsection),
                FieldBoost::unboosted(DocumentField::Text),
            ])
            .with_match_type(MatchType::BestFields)
            .with_boost(self.config.lexical_boost)
            .with_filter(filter.clone())
            .with_limit(cap);

        VectorQuery::new(&self.config.vector_field, vector)
            .with_num_candidates(self.config.num_candidates.max(CANDIDATES_PER_RESULT * cap))
            .with_boost(self.config.vector_boost)
            .with_keyword(lexical)
            .with_filter(filter.clone())
            .with_limit(cap)
    }
}

#[async_trait]
impl RetrievalStrategy for VectorStrategy {
    fn kind(&self) -> SearchStrategy {
        SearchStrategy::Vector
    }

    async fn retrieve(
        &self,
        query: &str,
        city: Option<&str>,
    ) -> Result<RetrievalResult, DomainError> {
        let filter = DocumentFilter::from_city(city);
        let vector = self.embedder.embed(query).await?;

        debug!(
            embedder = self.embedder.provider_name(),
            dimensions = vector.len(),
            field = %self.config.vector_field,
            "Query embedded"
        );

        let mut hits = self
            .store
            .search_vector(self.build_query(query, vector, &filter))
            .await?;
        sort_by_score(&mut hits);

        Ok(RetrievalResult::from_hits(
            hits,
            &filter,
            self.config.result_cap,
        ))
    }
}
