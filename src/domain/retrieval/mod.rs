//! Retrieval strategies, rank fusion and query routing

mod config;
mod fusion;
mod hybrid;
mod keyword;
mod local;
mod router;
mod strategy;
mod vector;

pub use config::RetrievalConfig;
pub use fusion::{DEFAULT_RRF_K, reciprocal_rank_fusion};
pub use hybrid::HybridStrategy;
pub use keyword::KeywordStrategy;
pub use local::LocalIndexStrategy;
pub use router::QueryRouter;
pub use strategy::{
    RetrievalResult, RetrievalStrategy, ScoredDocument, SearchStrategy, UnsupportedStrategy,
};
pub(crate) use strategy::sort_by_score;
pub use vector::VectorStrategy;

#[cfg(test)]
pub use router::mock::{StubStrategy, stub_router};
