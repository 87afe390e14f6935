//! Knowledge base domain - travel guide documents and the store contract

mod document;
mod filter;
mod query;
mod store;

pub use document::{Document, DocumentField, IndexedDocument};
pub use filter::DocumentFilter;
pub use query::{
    DenseSpec, FieldBoost, HybridQuery, KeywordQuery, MatchType, SparseSpec, StoreHit,
    VectorQuery,
};
pub use store::DocumentStore;

#[cfg(test)]
pub use store::MockDocumentStore;
