//! Embedding provider implementations

mod mistral;

pub use mistral::{DEFAULT_EMBEDDING_MODEL, MistralEmbeddingProvider};
