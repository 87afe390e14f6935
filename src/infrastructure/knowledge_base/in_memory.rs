//! In-memory document store for development and testing

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::bm25::{Bm25Field, tokenize};
use crate::domain::DomainError;
use crate::domain::embedding::normalized_cosine;
use crate::domain::knowledge_base::{
    DocumentField, DocumentFilter, DocumentStore, FieldBoost, HybridQuery, IndexedDocument,
    KeywordQuery, MatchType, StoreHit, VectorQuery,
};
use crate::domain::retrieval::{reciprocal_rank_fusion, sort_by_score};

#[derive(Debug, Default)]
struct Index {
    documents: Vec<IndexedDocument>,
    fields: HashMap<DocumentField, Bm25Field>,
}

impl Index {
    fn push(&mut self, indexed: IndexedDocument) {
        for field in DocumentField::ALL {
            self.fields
                .entry(field)
                .or_default()
                .push(indexed.document.field(field));
        }
        self.documents.push(indexed);
    }

    fn hit(&self, position: usize, score: f64) -> StoreHit {
        StoreHit::new(self.documents[position].document.clone(), score)
    }

    fn allowed(&self, position: usize, filter: &DocumentFilter) -> bool {
        filter.matches(&self.documents[position].document)
    }

    /// Per-document lexical scores for a keyword query, filter applied
    fn keyword_scores(&self, query: &KeywordQuery) -> HashMap<usize, f64> {
        let terms = tokenize(&query.text);
        let mut combined: HashMap<usize, f64> = HashMap::new();

        for boost in &query.fields {
            let Some(field) = self.fields.get(&boost.field) else {
                continue;
            };

            for (position, score) in field.scores(&terms) {
                if !self.allowed(position, &query.filter) {
                    continue;
                }

                let weighted = score * boost.boost;
                let entry = combined.entry(position).or_insert(0.0);
                *entry = match query.match_type {
                    MatchType::BestFields => entry.max(weighted),
                    MatchType::MostFields => *entry + weighted,
                };
            }
        }

        combined
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .map(|(position, score)| (position, score * query.boost))
            .collect()
    }

    /// Nearest documents by normalized cosine similarity, best first
    fn nearest(
        &self,
        field: &str,
        vector: &[f32],
        filter: &DocumentFilter,
        limit: usize,
    ) -> Vec<(usize, f64)> {
        let mut scored: Vec<(usize, f64)> = self
            .documents
            .iter()
            .enumerate()
            .filter(|(_, indexed)| filter.matches(&indexed.document))
            .filter_map(|(position, indexed)| {
                indexed
                    .vector(field)
                    .map(|candidate| (position, normalized_cosine(vector, candidate)))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1).then_with(|| {
                self.documents[a.0]
                    .document
                    .id
                    .cmp(&self.documents[b.0].document.id)
            })
        });
        scored.truncate(limit);
        scored
    }

    fn ranked(
        &self,
        scores: impl IntoIterator<Item = (usize, f64)>,
        limit: usize,
    ) -> Vec<StoreHit> {
        let mut hits: Vec<StoreHit> = scores
            .into_iter()
            .map(|(position, score)| self.hit(position, score))
            .collect();
        sort_by_score(&mut hits);
        hits.truncate(limit);
        hits
    }
}

/// Process-local store with BM25 lexical scoring and cosine similarity
///
/// Lexical queries score each field with BM25. Vector queries add the
/// boosted similarity of the `limit` nearest neighbours to the boosted
/// lexical score. Hybrid queries fuse a dense list and a BM25 list over the
/// text field with [`reciprocal_rank_fusion`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    index: Arc<RwLock<Index>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_documents(documents: Vec<IndexedDocument>) -> Self {
        let store = Self::new();
        store.add_documents(documents).await;
        store
    }

    pub async fn add_documents(&self, documents: Vec<IndexedDocument>) -> usize {
        let mut index = self.index.write().await;
        let count = documents.len();

        for document in documents {
            index.push(document);
        }

        debug!(added = count, total = index.documents.len(), "Documents indexed");
        count
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn dense_list(&self, query: &HybridQuery) -> Result<Vec<StoreHit>, DomainError> {
        let vector = query.dense.require_vector(self.store_name())?;
        let index = self.index.read().await;
        Ok(index
            .nearest(&query.dense.field, vector, &query.filter, query.fan_out)
            .into_iter()
            .map(|(position, score)| index.hit(position, score))
            .collect())
    }

    async fn sparse_list(&self, query: &HybridQuery) -> Result<Vec<StoreHit>, DomainError> {
        let index = self.index.read().await;
        let keyword = KeywordQuery::new(&query.sparse.text)
            .with_fields(vec![FieldBoost::unboosted(DocumentField::Text)])
            .with_filter(query.filter.clone());

        Ok(index.ranked(index.keyword_scores(&keyword), query.fan_out))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn store_name(&self) -> &'static str {
        "in_memory"
    }

    async fn search_keyword(&self, query: KeywordQuery) -> Result<Vec<StoreHit>, DomainError> {
        let index = self.index.read().await;
        Ok(index.ranked(index.keyword_scores(&query), query.limit))
    }

    async fn search_vector(&self, query: VectorQuery) -> Result<Vec<StoreHit>, DomainError> {
        let index = self.index.read().await;
        let mut combined: HashMap<usize, f64> = HashMap::new();

        for (position, similarity) in
            index.nearest(&query.field, &query.vector, &query.filter, query.limit)
        {
            *combined.entry(position).or_insert(0.0) += similarity * query.boost;
        }

        if let Some(keyword) = &query.keyword {
            let keyword = keyword.clone().with_filter(query.filter.clone());
            for (position, score) in index.keyword_scores(&keyword) {
                *combined.entry(position).or_insert(0.0) += score;
            }
        }

        Ok(index.ranked(combined, query.limit))
    }

    async fn search_hybrid(&self, query: HybridQuery) -> Result<Vec<StoreHit>, DomainError> {
        let (dense, sparse) =
            tokio::try_join!(self.dense_list(&query), self.sparse_list(&query))?;

        debug!(
            dense = dense.len(),
            sparse = sparse.len(),
            "Fusing hybrid candidate lists"
        );

        Ok(reciprocal_rank_fusion(
            &[dense, sparse],
            query.rrf_k,
            query.limit,
        ))
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        // In-memory store is always healthy
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::knowledge_base::{DenseSpec, Document, SparseSpec};

    fn doc(id: &str, city: &str, section: &str, text: &str, vector: Vec<f32>) -> IndexedDocument {
        IndexedDocument::new(Document::new(id, city, section, text))
            .with_vector("all_data_vector", vector.clone())
            .with_vector("jina-small", vector)
    }

    async fn store() -> InMemoryDocumentStore {
        InMemoryDocumentStore::with_documents(vec![
            doc("cairo-1", "Cairo", "Eat", "Koshary is the national street food", vec![1.0, 0.0]),
            doc("cairo-2", "Cairo", "See", "The pyramids of Giza at sunrise", vec![0.0, 1.0]),
            doc(
                "rome-1",
                "Rome",
                "Eat",
                "Street food in Rome means suppli and pizza",
                vec![0.9, 0.1],
            ),
            doc("seoul-1", "Seoul", "Shop", "Myeongdong market for street snacks", vec![0.7, 0.7]),
        ])
        .await
    }

    #[tokio::test]
    async fn test_keyword_search_respects_filter() {
        let store = store().await;
        let query = KeywordQuery::new("street food").with_filter(DocumentFilter::city("Cairo"));

        let hits = store.search_keyword(query).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.id, "cairo-1");
    }

    #[tokio::test]
    async fn test_keyword_search_without_filter_ranks_all_cities() {
        let store = store().await;
        let hits = store.search_keyword(KeywordQuery::new("street food")).await.unwrap();

        let ids: Vec<&str> = hits.iter().map(|h| h.document.id.as_str()).collect();
        assert!(ids.contains(&"rome-1"));
        assert!(ids.contains(&"seoul-1"));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_most_fields_sums_boosted_fields() {
        let store = store().await;
        let best = KeywordQuery::new("eat koshary").with_fields(vec![
            FieldBoost::new(DocumentField::Section, 0.5),
            FieldBoost::new(DocumentField::Text, 3.0),
        ]);
        let most = best.clone().with_match_type(MatchType::MostFields);

        let best_hits = store.search_keyword(best).await.unwrap();
        let most_hits = store.search_keyword(most).await.unwrap();

        assert_eq!(most_hits[0].document.id, "cairo-1");
        assert!(most_hits[0].score > best_hits[0].score);
    }

    #[tokio::test]
    async fn test_keyword_limit() {
        let store = store().await;
        let hits = store
            .search_keyword(KeywordQuery::new("street").with_limit(2))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_vector_search_blends_similarity_and_keywords() {
        let store = store().await;
        let query = VectorQuery::new("all_data_vector", vec![0.0, 1.0])
            .with_boost(0.5)
            .with_keyword(KeywordQuery::new("koshary").with_boost(0.5))
            .with_filter(DocumentFilter::city("Cairo"))
            .with_limit(5);

        let hits = store.search_vector(query).await.unwrap();

        assert!(hits.iter().all(|h| h.document.city == "Cairo"));
        assert_eq!(hits.len(), 2);
        // cairo-1 gets the keyword match on top of its (lower) similarity
        let cairo_1 = hits.iter().find(|h| h.document.id == "cairo-1").unwrap();
        assert!(cairo_1.score > 0.5 * normalized_cosine(&[0.0, 1.0], &[1.0, 0.0]));
    }

    #[tokio::test]
    async fn test_vector_search_skips_documents_without_vector() {
        let store = InMemoryDocumentStore::with_documents(vec![IndexedDocument::new(
            Document::new("bare", "London", "See", "Tower Bridge"),
        )])
        .await;

        let hits = store
            .search_vector(VectorQuery::new("all_data_vector", vec![1.0]))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_hybrid_search_fuses_and_filters() {
        let store = store().await;
        let query = HybridQuery {
            dense: DenseSpec {
                field: "jina-small".to_string(),
                vector: Some(vec![1.0, 0.0]),
                num_candidates: 100,
            },
            sparse: SparseSpec {
                field: "bm25".to_string(),
                text: "street food".to_string(),
            },
            filter: DocumentFilter::city("Cairo"),
            fan_out: 25,
            limit: 5,
            rrf_k: 60.0,
        };

        let hits = store.search_hybrid(query).await.unwrap();

        assert!(hits.iter().all(|h| h.document.city == "Cairo"));
        // cairo-1 is first in both lists
        assert_eq!(hits[0].document.id, "cairo-1");
        assert!((hits[0].score - 2.0 / 61.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_health_and_len() {
        let store = store().await;
        assert!(store.health_check().await.unwrap());
        assert_eq!(store.len().await, 4);
        assert!(InMemoryDocumentStore::new().is_empty().await);
    }
}
