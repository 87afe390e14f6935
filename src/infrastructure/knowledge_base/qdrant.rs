//! Qdrant query API adapter with server-side reciprocal rank fusion

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::payload::decode_hit;
use crate::domain::DomainError;
use crate::domain::knowledge_base::{
    DocumentField, DocumentFilter, DocumentStore, HybridQuery, KeywordQuery, StoreHit,
    VectorQuery,
};
use crate::infrastructure::http::HttpClientTrait;

const STORE: &str = "qdrant";

/// Server-side inference model for the sparse BM25 list
pub const SPARSE_MODEL: &str = "Qdrant/bm25";

/// Server-side inference model filling the 512-dimension `jina-small` vector
pub const DEFAULT_DENSE_MODEL: &str = "jinaai/jina-embeddings-v2-small-en";

/// Qdrant store holding a dense and a sparse named vector per point
///
/// Only hybrid queries are served; keyword search and lexical-blended vector
/// search have no Qdrant equivalent and are reported as unsupported.
///
/// With a dense model set, the dense prefetch sends the query text and Qdrant
/// embeds it with that model, matching how the collection was indexed.
#[derive(Debug)]
pub struct QdrantStore<C: HttpClientTrait> {
    client: C,
    base_url: String,
    collection: String,
    api_key: Option<String>,
    dense_model: Option<String>,
}

impl<C: HttpClientTrait> QdrantStore<C> {
    pub fn new(client: C, base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            api_key: None,
            dense_model: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_dense_model(mut self, dense_model: Option<String>) -> Self {
        self.dense_model = dense_model;
        self
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];
        if let Some(key) = &self.api_key {
            headers.push(("api-key", key.as_str()));
        }
        headers
    }

    async fn query_points(&self, body: Value) -> Result<Vec<StoreHit>, DomainError> {
        debug!(collection = %self.collection, "Running Qdrant query");

        let url = format!("{}/points/query", self.collection_url());
        let json = self.client.post_json(&url, self.headers(), &body).await?;

        let response: QueryResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(STORE, format!("Failed to parse query response: {}", e))
        })?;

        response
            .result
            .points
            .into_iter()
            .map(|point| {
                let payload = point.payload.unwrap_or(Value::Null);
                decode_hit(STORE, payload, &point.id, point.score)
            })
            .collect()
    }
}

fn filter_clause(filter: &DocumentFilter) -> Option<Value> {
    filter.city_value().map(|city| {
        json!({
            "must": [{"key": DocumentField::City.as_str(), "match": {"value": city}}]
        })
    })
}

fn dense_prefetch_query(
    query: &HybridQuery,
    dense_model: Option<&str>,
) -> Result<Value, DomainError> {
    match dense_model {
        Some(model) => Ok(json!({"text": query.sparse.text, "model": model})),
        None => Ok(json!(query.dense.require_vector(STORE)?)),
    }
}

fn hybrid_body(query: &HybridQuery, dense_model: Option<&str>) -> Result<Value, DomainError> {
    let filter = filter_clause(&query.filter);

    let mut dense = json!({
        "query": dense_prefetch_query(query, dense_model)?,
        "using": query.dense.field,
        "limit": query.fan_out,
    });
    let mut sparse = json!({
        "query": {"text": query.sparse.text, "model": SPARSE_MODEL},
        "using": query.sparse.field,
        "limit": query.fan_out,
    });

    let mut body = json!({
        "query": {"rrf": {"k": query.rrf_k}},
        "with_payload": true,
        "limit": query.limit,
    });

    if let Some(filter) = filter {
        dense["filter"] = filter.clone();
        sparse["filter"] = filter.clone();
        body["filter"] = filter;
    }

    body["prefetch"] = json!([dense, sparse]);
    Ok(body)
}

fn vector_body(query: &VectorQuery) -> Value {
    let mut body = json!({
        "query": query.vector,
        "using": query.field,
        "with_payload": true,
        "limit": query.limit,
    });

    if let Some(filter) = filter_clause(&query.filter) {
        body["filter"] = filter;
    }

    body
}

#[async_trait]
impl<C: HttpClientTrait> DocumentStore for QdrantStore<C> {
    fn store_name(&self) -> &'static str {
        STORE
    }

    fn embeds_query_text(&self) -> bool {
        self.dense_model.is_some()
    }

    async fn search_keyword(&self, _query: KeywordQuery) -> Result<Vec<StoreHit>, DomainError> {
        Err(DomainError::unsupported(STORE, "keyword search"))
    }

    /// Pure nearest-neighbour search over one named vector
    async fn search_vector(&self, query: VectorQuery) -> Result<Vec<StoreHit>, DomainError> {
        if query.keyword.is_some() {
            return Err(DomainError::unsupported(
                STORE,
                "vector search blended with a keyword clause",
            ));
        }

        self.query_points(vector_body(&query)).await
    }

    async fn search_hybrid(&self, query: HybridQuery) -> Result<Vec<StoreHit>, DomainError> {
        let body = hybrid_body(&query, self.dense_model.as_deref())?;
        self.query_points(body).await
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        let json = self
            .client
            .get_json(&self.collection_url(), self.headers())
            .await?;

        let status = json
            .pointer("/result/status")
            .and_then(Value::as_str)
            .unwrap_or("red");

        Ok(status != "red")
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    points: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: Value,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    payload: Option<Value>,
}
