//! Retrieval tuning knobs

use serde::{Deserialize, Serialize};

use super::strategy::SearchStrategy;
use crate::domain::DomainError;

/// Parameters shared by the retrieval strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum number of documents any strategy returns
    pub result_cap: usize,
    /// RRF smoothing constant
    pub rrf_k: f64,
    /// Hybrid sub-queries fetch `fan_out_multiplier * result_cap` candidates
    pub fan_out_multiplier: usize,
    /// Candidate pool examined by the nearest-neighbour search
    pub num_candidates: usize,
    /// Weight of the lexical clause in vector search
    pub lexical_boost: f64,
    /// Weight of the similarity clause in vector search
    pub vector_boost: f64,
    /// Dense field queried by the vector strategy
    pub vector_field: String,
    /// Dense field queried by the hybrid strategy
    pub dense_field: String,
    /// Sparse field queried by the hybrid strategy
    pub sparse_field: String,
    /// Strategy used when the requested one is unknown or absent
    pub default_strategy: SearchStrategy,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            result_cap: 5,
            rrf_k: 60.0,
            fan_out_multiplier: 5,
            num_candidates: 10_000,
            lexical_boost: 0.5,
            vector_boost: 0.5,
            vector_field: "all_data_vector".to_string(),
            dense_field: "jina-small".to_string(),
            sparse_field: "bm25".to_string(),
            default_strategy: SearchStrategy::LexicalIndexLocal,
        }
    }
}

impl RetrievalConfig {
    pub fn fan_out(&self) -> usize {
        self.fan_out_multiplier.max(1) * self.result_cap
    }

    pub fn with_result_cap(mut self, cap: usize) -> Self {
        self.result_cap = cap;
        self
    }

    /// Reject settings that would break rank fusion or return nothing
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.rrf_k.is_finite() || self.rrf_k < 0.0 {
            return Err(DomainError::configuration(format!(
                "retrieval.rrf_k must be a non-negative number, got {}",
                self.rrf_k
            )));
        }
        if self.result_cap == 0 {
            return Err(DomainError::configuration(
                "retrieval.result_cap must be at least 1",
            ));
        }
        Ok(())
    }
}
