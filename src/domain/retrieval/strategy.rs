//! Retrieval strategy contract and ranked results

use std::fmt::{self, Debug};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::DomainError;
use crate::domain::knowledge_base::{Document, DocumentFilter, StoreHit};

/// Closed set of retrieval strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Multi-field lexical match on the search cluster
    Keyword,
    /// Nearest-neighbour search blended with a lexical signal
    Vector,
    /// Dense + sparse lists fused with reciprocal rank fusion
    HybridFusion,
    /// Lexical search on the process-local index
    LexicalIndexLocal,
}

impl SearchStrategy {
    pub const ALL: [SearchStrategy; 4] = [
        Self::Keyword,
        Self::Vector,
        Self::HybridFusion,
        Self::LexicalIndexLocal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Vector => "vector",
            Self::HybridFusion => "hybrid_fusion",
            Self::LexicalIndexLocal => "lexical_index_local",
        }
    }

    /// Label historically shown in the chat UI and stored with feedback
    pub fn legacy_label(&self) -> &'static str {
        match self {
            Self::Keyword => "Elasticsearch_Text",
            Self::Vector => "Elasticsearch_Vector",
            Self::HybridFusion => "Qdrant",
            Self::LexicalIndexLocal => "MinSearch",
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a strategy name is not recognised
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unsupported search strategy: {name}")]
pub struct UnsupportedStrategy {
    pub name: String,
}

impl FromStr for SearchStrategy {
    type Err = UnsupportedStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|strategy| {
                strategy.as_str().eq_ignore_ascii_case(name)
                    || strategy.legacy_label().eq_ignore_ascii_case(name)
            })
            .ok_or_else(|| UnsupportedStrategy {
                name: s.to_string(),
            })
    }
}

/// A retrieved document with its strategy score and 1-based rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f64,
    pub rank: usize,
}

/// Ordered retrieval output; position `i` holds rank `i + 1`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    documents: Vec<ScoredDocument>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from hits already in strategy order
    ///
    /// Hits that violate the filter are dropped, the rest truncated to `cap`
    /// and ranked from 1.
    pub fn from_hits(hits: Vec<StoreHit>, filter: &DocumentFilter, cap: usize) -> Self {
        let documents = hits
            .into_iter()
            .filter(|hit| {
                let keep = filter.matches(&hit.document);
                if !keep {
                    warn!(
                        document_id = %hit.document.id,
                        city = %hit.document.city,
                        "Store returned a document outside the city filter, dropping it"
                    );
                }
                keep
            })
            .take(cap)
            .enumerate()
            .map(|(i, hit)| ScoredDocument {
                document: hit.document,
                score: hit.score,
                rank: i + 1,
            })
            .collect();

        Self { documents }
    }

    pub fn documents(&self) -> &[ScoredDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.document.id.as_str()).collect()
    }
}

impl IntoIterator for RetrievalResult {
    type Item = ScoredDocument;
    type IntoIter = std::vec::IntoIter<ScoredDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

/// Sort hits by descending score, ties broken by ascending document id
pub(crate) fn sort_by_score(hits: &mut [StoreHit]) {
    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.document.id.cmp(&b.document.id))
    });
}

/// Turns query text and an optional city into ranked documents
#[async_trait]
pub trait RetrievalStrategy: Send + Sync + Debug {
    fn kind(&self) -> SearchStrategy;

    async fn retrieve(&self, query: &str, city: Option<&str>)
    -> Result<RetrievalResult, DomainError>;
}
