//! Document store adapter trait

use std::fmt::Debug;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::query::{HybridQuery, KeywordQuery, StoreHit, VectorQuery};
use crate::domain::error::DomainError;

/// Read-only query surface over keyword, vector and hybrid indexes
///
/// Every operation honours the query's city filter and returns at most
/// `limit` hits in rank order. Backends that cannot serve an operation
/// return [`DomainError::Unsupported`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Backend name used in logs and errors
    fn store_name(&self) -> &'static str;

    /// Whether hybrid queries may omit the dense vector because the backend
    /// embeds the query text server-side
    fn embeds_query_text(&self) -> bool {
        false
    }

    /// Multi-field lexical search
    async fn search_keyword(&self, query: KeywordQuery) -> Result<Vec<StoreHit>, DomainError>;

    /// Nearest-neighbour search, blended with an optional lexical query
    async fn search_vector(&self, query: VectorQuery) -> Result<Vec<StoreHit>, DomainError>;

    /// Dense + sparse search fused with reciprocal rank fusion
    async fn search_hybrid(&self, query: HybridQuery) -> Result<Vec<StoreHit>, DomainError>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> Result<bool, DomainError>;
}
