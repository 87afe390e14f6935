//! Strategy selection and dispatch

use std::sync::Arc;

use tracing::{debug, warn};

use super::strategy::{RetrievalResult, RetrievalStrategy, SearchStrategy};
use crate::domain::DomainError;

/// Dispatches a query to one of the four retrieval strategies
#[derive(Debug, Clone)]
pub struct QueryRouter {
    keyword: Arc<dyn RetrievalStrategy>,
    vector: Arc<dyn RetrievalStrategy>,
    hybrid: Arc<dyn RetrievalStrategy>,
    local: Arc<dyn RetrievalStrategy>,
    default_strategy: SearchStrategy,
}

impl QueryRouter {
    pub fn new(
        keyword: Arc<dyn RetrievalStrategy>,
        vector: Arc<dyn RetrievalStrategy>,
        hybrid: Arc<dyn RetrievalStrategy>,
        local: Arc<dyn RetrievalStrategy>,
    ) -> Self {
        Self {
            keyword,
            vector,
            hybrid,
            local,
            default_strategy: SearchStrategy::LexicalIndexLocal,
        }
    }

    pub fn with_default_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    pub fn default_strategy(&self) -> SearchStrategy {
        self.default_strategy
    }

    /// Resolve a strategy name, falling back to the default when it is
    /// absent or unrecognised
    pub fn resolve(&self, name: Option<&str>) -> SearchStrategy {
        match name.map(str::parse::<SearchStrategy>) {
            None => self.default_strategy,
            Some(Ok(strategy)) => strategy,
            Some(Err(e)) => {
                warn!(
                    requested = %e.name,
                    fallback = %self.default_strategy,
                    "{}, using default strategy", e
                );
                self.default_strategy
            }
        }
    }

    pub fn strategy(&self, strategy: SearchStrategy) -> &Arc<dyn RetrievalStrategy> {
        match strategy {
            SearchStrategy::Keyword => &self.keyword,
            SearchStrategy::Vector => &self.vector,
            SearchStrategy::HybridFusion => &self.hybrid,
            SearchStrategy::LexicalIndexLocal => &self.local,
        }
    }

    /// Run the query through the given strategy; failures propagate unchanged
    pub async fn route(
        &self,
        query: &str,
        city: Option<&str>,
        strategy: SearchStrategy,
    ) -> Result<RetrievalResult, DomainError> {
        debug!(strategy = %strategy, city = ?city, "Routing query");
        self.strategy(strategy).retrieve(query, city).await
    }
}
