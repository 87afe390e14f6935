//! Query descriptions understood by document stores

use serde::{Deserialize, Serialize};

use super::document::{Document, DocumentField};
use super::filter::DocumentFilter;
use crate::domain::error::DomainError;

/// A field to match against, with its score multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldBoost {
    pub field: DocumentField,
    pub boost: f64,
}

impl FieldBoost {
    pub fn new(field: DocumentField, boost: f64) -> Self {
        Self { field, boost }
    }

    pub fn unboosted(field: DocumentField) -> Self {
        Self::new(field, 1.0)
    }
}

/// How per-field scores are combined into a document score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Score of the best matching field
    #[default]
    BestFields,
    /// Sum of the scores of all matching fields
    MostFields,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BestFields => "best_fields",
            Self::MostFields => "most_fields",
        }
    }
}

/// Multi-field lexical query
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordQuery {
    pub text: String,
    pub fields: Vec<FieldBoost>,
    pub match_type: MatchType,
    /// Multiplier applied to the whole lexical score
    pub boost: f64,
    pub filter: DocumentFilter,
    pub limit: usize,
}

impl KeywordQuery {
    /// Query over every document field with best-field scoring and limit 10
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fields: DocumentField::ALL
                .iter()
                .copied()
                .map(FieldBoost::unboosted)
                .collect(),
            match_type: MatchType::BestFields,
            boost: 1.0,
            filter: DocumentFilter::none(),
            limit: 10,
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldBoost>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_match_type(mut self, match_type: MatchType) -> Self {
        self.match_type = match_type;
        self
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }

    pub fn with_filter(mut self, filter: DocumentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Nearest-neighbour query on a named vector field, optionally blended
/// additively with a lexical query
#[derive(Debug, Clone, PartialEq)]
pub struct VectorQuery {
    pub field: String,
    pub vector: Vec<f32>,
    /// Number of candidates examined per shard before filtering down to `limit`
    pub num_candidates: usize,
    /// Multiplier applied to the vector similarity score
    pub boost: f64,
    pub keyword: Option<KeywordQuery>,
    pub filter: DocumentFilter,
    pub limit: usize,
}

impl VectorQuery {
    pub fn new(field: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            field: field.into(),
            vector,
            num_candidates: 100,
            boost: 1.0,
            keyword: None,
            filter: DocumentFilter::none(),
            limit: 10,
        }
    }

    pub fn with_num_candidates(mut self, num_candidates: usize) -> Self {
        self.num_candidates = num_candidates;
        self
    }

    pub fn with_boost(mut self, boost: f64) -> Self {
        self.boost = boost;
        self
    }

    pub fn with_keyword(mut self, keyword: KeywordQuery) -> Self {
        self.keyword = Some(keyword);
        self
    }

    pub fn with_filter(mut self, filter: DocumentFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Dense side of a hybrid query
#[derive(Debug, Clone, PartialEq)]
pub struct DenseSpec {
    pub field: String,
    /// Query embedding; `None` when the store embeds the query text itself
    pub vector: Option<Vec<f32>>,
    /// Candidate pool examined by the nearest-neighbour search
    pub num_candidates: usize,
}

impl DenseSpec {
    /// The query embedding, or `Unsupported` for stores that cannot embed text
    pub fn require_vector(&self, store: &str) -> Result<&[f32], DomainError> {
        self.vector
            .as_deref()
            .ok_or_else(|| DomainError::unsupported(store, "hybrid search without a query vector"))
    }
}

/// Sparse (BM25) side of a hybrid query
#[derive(Debug, Clone, PartialEq)]
pub struct SparseSpec {
    pub field: String,
    pub text: String,
}

/// Two ranked sub-queries fused with reciprocal rank fusion
#[derive(Debug, Clone, PartialEq)]
pub struct HybridQuery {
    pub dense: DenseSpec,
    pub sparse: SparseSpec,
    pub filter: DocumentFilter,
    /// Candidate limit requested from each sub-query
    pub fan_out: usize,
    /// Final number of fused results
    pub limit: usize,
    /// RRF smoothing constant
    pub rrf_k: f64,
}

/// A document returned by a store with its backend score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreHit {
    pub document: Document,
    pub score: f64,
}

impl StoreHit {
    pub fn new(document: Document, score: f64) -> Self {
        Self { document, score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_query_defaults_cover_all_fields() {
        let query = KeywordQuery::new("koshary");
        assert_eq!(query.fields.len(), 4);
        assert_eq!(query.match_type, MatchType::BestFields);
        assert!(query.filter.is_empty());
    }

    #[test]
    fn test_vector_query_builder() {
        let query = VectorQuery::new("all_data_vector", vec![0.0, 1.0])
            .with_num_candidates(10_000)
            .with_boost(0.5)
            .with_limit(5)
            .with_filter(DocumentFilter::city("Rome"));

        assert_eq!(query.num_candidates, 10_000);
        assert_eq!(query.boost, 0.5);
        assert_eq!(query.limit, 5);
        assert_eq!(query.filter.city_value(), Some("Rome"));
        assert!(query.keyword.is_none());
    }

    #[test]
    fn test_dense_spec_without_vector_is_unsupported() {
        let dense = DenseSpec {
            field: "jina-small".to_string(),
            vector: None,
            num_candidates: 100,
        };
        let err = dense.require_vector("in_memory").unwrap_err();
        assert!(matches!(err, DomainError::Unsupported { .. }));

        let dense = DenseSpec {
            vector: Some(vec![0.5]),
            ..dense
        };
        assert_eq!(dense.require_vector("in_memory").unwrap(), &[0.5]);
    }
}
