//! Lexical retrieval on the process-local index

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::config::RetrievalConfig;
use super::strategy::{RetrievalResult, RetrievalStrategy, SearchStrategy, sort_by_score};
use crate::domain::DomainError;
use crate::domain::knowledge_base::{
    DocumentField, DocumentFilter, DocumentStore, FieldBoost, KeywordQuery, MatchType,
};

const TEXT_BOOST: f64 = 3.0;
const SECTION_BOOST: f64 = 0.5;

/// Keyword search over section and text, with per-field scores summed
#[derive(Debug)]
pub struct LocalIndexStrategy {
    index: Arc<dyn DocumentStore>,
    config: RetrievalConfig,
}

impl LocalIndexStrategy {
    pub fn new(index: Arc<dyn DocumentStore>, config: RetrievalConfig) -> Self {
        Self { index, config }
    }
}

#[async_trait]
impl RetrievalStrategy for LocalIndexStrategy {
    fn kind(&self) -> SearchStrategy {
        SearchStrategy::LexicalIndexLocal
    }

    async fn retrieve(
        &self,
        query: &str,
        city: Option<&str>,
    ) -> Result<RetrievalResult, DomainError> {
        let filter = DocumentFilter::from_city(city);
        let keyword = KeywordQuery::new(query)
            .with_fields(vec![
                FieldBoost::new(DocumentField::Section, SECTION_BOOST),
                FieldBoost::new(DocumentField::Text, TEXT_BOOST),
            ])
            .with_match_type(MatchType::MostFields)
            .with_filter(filter.clone())
            .with_limit(self.config.result_cap);

        let mut hits = self.index.search_keyword(keyword).await?;
        sort_by_score(&mut hits);

        debug!(hits = hits.len(), "Local index search completed");

        Ok(RetrievalResult::from_hits(
            hits,
            &filter,
            self.config.result_cap,
        ))
    }
}
