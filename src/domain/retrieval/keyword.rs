//! Keyword retrieval over the search cluster

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::config::RetrievalConfig;
use super::strategy::{RetrievalResult, RetrievalStrategy, SearchStrategy, sort_by_score};
use crate::domain::DomainError;
use crate::domain::knowledge_base::{DocumentFilter, DocumentStore, KeywordQuery, MatchType};

/// Multi-field lexical match over city, section, subsection and text,
/// scored by the best matching field
#[derive(Debug)]
pub struct KeywordStrategy {
    store: Arc<dyn DocumentStore>,
    config: RetrievalConfig,
}

impl KeywordStrategy {
    pub fn new(store: Arc<dyn DocumentStore>, config: RetrievalConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl RetrievalStrategy for KeywordStrategy {
    fn kind(&self) -> SearchStrategy {
        SearchStrategy::Keyword
    }

    async fn retrieve(
        &self,
        query: &str,
        city: Option<&str>,
    ) -> Result<RetrievalResult, DomainError> {
        let filter = DocumentFilter::from_city(city);
        let keyword = KeywordQuery::new(query)
            .with_match_type(MatchType::BestFields)
            .with_filter(filter.clone())
            .with_limit(self.config.result_cap);

        let mut hits = self.store.search_keyword(keyword).await?;
        sort_by_score(&mut hits);

        debug!(
            store = self.store.store_name(),
            hits = hits.len(),
            "Keyword search completed"
        );

        Ok(RetrievalResult::from_hits(
            hits,
            &filter,
            self.config.result_cap,
        ))
    }
}
