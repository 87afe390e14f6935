//! Document store implementations

mod bm25;
mod elasticsearch;
mod in_memory;
mod loader;
mod payload;
mod qdrant;

pub use bm25::{Bm25Field, tokenize};
pub use elasticsearch::ElasticsearchStore;
pub use in_memory::InMemoryDocumentStore;
pub use loader::{embed_missing, load_documents};
pub use qdrant::{DEFAULT_DENSE_MODEL, QdrantStore, SPARSE_MODEL};
