//! Elasticsearch `_search` adapter

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::payload::decode_hit;
use crate::domain::DomainError;
use crate::domain::knowledge_base::{
    DocumentField, DocumentFilter, DocumentStore, FieldBoost, HybridQuery, KeywordQuery,
    MatchType, StoreHit, VectorQuery,
};
use crate::domain::retrieval::reciprocal_rank_fusion;
use crate::infrastructure::http::HttpClientTrait;

const STORE: &str = "elasticsearch";

/// Fields returned with every hit
const SOURCE_FIELDS: [&str; 5] = ["id", "city", "section", "subsection", "text"];

/// Elasticsearch store for keyword, knn+keyword and locally fused hybrid search
#[derive(Debug)]
pub struct ElasticsearchStore<C: HttpClientTrait> {
    client: C,
    base_url: String,
    index: String,
    auth_header: Option<String>,
}

impl<C: HttpClientTrait> ElasticsearchStore<C> {
    pub fn new(client: C, base_url: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            index: index.into(),
            auth_header: None,
        }
    }

    /// Authenticate with an API key
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.auth_header = api_key.map(|key| format!("ApiKey {}", key));
        self
    }

    fn search_url(&self) -> String {
        format!("{}/{}/_search", self.base_url, self.index)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];
        if let Some(auth) = &self.auth_header {
            headers.push(("Authorization", auth.as_str()));
        }
        headers
    }

    async fn search(&self, body: Value) -> Result<Vec<StoreHit>, DomainError> {
        debug!(index = %self.index, "Running Elasticsearch query");

        let json = self
            .client
            .post_json(&self.search_url(), self.headers(), &body)
            .await?;

        let response: SearchResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(STORE, format!("Failed to parse search response: {}", e))
        })?;

        response
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let id = Value::String(hit.id);
                decode_hit(STORE, hit.source, &id, hit.score.unwrap_or(0.0))
            })
            .collect()
    }
}

fn field_spec(boost: &FieldBoost) -> String {
    if boost.boost == 1.0 {
        boost.field.as_str().to_string()
    } else {
        format!("{}^{}", boost.field.as_str(), boost.boost)
    }
}

fn filter_clause(filter: &DocumentFilter) -> Vec<Value> {
    filter
        .city_value()
        .map(|city| vec![json!({"term": {"city": city}})])
        .unwrap_or_default()
}

fn keyword_clause(query: &KeywordQuery) -> Value {
    let fields: Vec<String> = query.fields.iter().map(field_spec).collect();

    json!({
        "bool": {
            "must": [{
                "multi_match": {
                    "query": query.text,
                    "fields": fields,
                    "type": query.match_type.as_str(),
                    "boost": query.boost,
                }
            }],
            "filter": filter_clause(&query.filter),
        }
    })
}

fn keyword_body(query: &KeywordQuery) -> Value {
    json!({
        "size": query.limit,
        "query": keyword_clause(query),
        "_source": SOURCE_FIELDS,
    })
}

fn knn_clause(
    field: &str,
    vector: &[f32],
    k: usize,
    num_candidates: usize,
    boost: f64,
    filter: &DocumentFilter,
) -> Value {
    let mut knn = json!({
        "field": field,
        "query_vector": vector,
        "k": k,
        "num_candidates": num_candidates.max(k),
        "boost": boost,
    });

    if let Some(clause) = filter_clause(filter).into_iter().next() {
        knn["filter"] = clause;
    }

    knn
}

fn vector_body(query: &VectorQuery) -> Value {
    let mut body = json!({
        "knn": knn_clause(
            &query.field,
            &query.vector,
            query.limit,
            query.num_candidates,
            query.boost,
            &query.filter,
        ),
        "size": query.limit,
        "_source": SOURCE_FIELDS,
    });

    if let Some(keyword) = &query.keyword {
        let keyword = keyword.clone().with_filter(query.filter.clone());
        body["query"] = keyword_clause(&keyword);
    }

    body
}

#[async_trait]
impl<C: HttpClientTrait> DocumentStore for ElasticsearchStore<C> {
    fn store_name(&self) -> &'static str {
        STORE
    }

    async fn search_keyword(&self, query: KeywordQuery) -> Result<Vec<StoreHit>, DomainError> {
        self.search(keyword_body(&query)).await
    }

    async fn search_vector(&self, query: VectorQuery) -> Result<Vec<StoreHit>, DomainError> {
        self.search(vector_body(&query)).await
    }

    /// Dense knn and BM25 text match run concurrently, fused locally
    async fn search_hybrid(&self, query: HybridQuery) -> Result<Vec<StoreHit>, DomainError> {
        let dense = json!({
            "knn": knn_clause(
                &query.dense.field,
                query.dense.require_vector(STORE)?,
                query.fan_out,
                query.dense.num_candidates,
                1.0,
                &query.filter,
            ),
            "size": query.fan_out,
            "_source": SOURCE_FIELDS,
        });
        let sparse = keyword_body(
            &KeywordQuery::new(&query.sparse.text)
                .with_fields(vec![FieldBoost::unboosted(DocumentField::Text)])
                .with_match_type(MatchType::BestFields)
                .with_filter(query.filter.clone())
                .with_limit(query.fan_out),
        );

        let (dense, sparse) = tokio::try_join!(self.search(dense), self.search(sparse))?;

        Ok(reciprocal_rank_fusion(
            &[dense, sparse],
            query.rrf_k,
            query.limit,
        ))
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        let url = format!("{}/_cluster/health", self.base_url);
        let health: ClusterHealth =
            serde_json::from_value(self.client.get_json(&url, self.headers()).await?).map_err(
                |e| DomainError::provider(STORE, format!("Failed to parse health response: {}", e)),
            )?;

        Ok(health.status != "red")
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: Value,
}

#[derive(Debug, Deserialize)]
struct ClusterHealth {
    status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::mock::MockHttpClient;

    const SEARCH_URL: &str = "http://localhost:9200/travel/_search";

    fn response(hits: Value) -> Value {
        json!({"took": 3, "hits": {"total": {"value": 2}, "hits": hits}})
    }

    fn store(client: MockHttpClient) -> ElasticsearchStore<MockHttpClient> {
        ElasticsearchStore::new(client, "http://localhost:9200/", "travel")
    }

    #[tokio::test]
    async fn test_keyword_search() {
        let client = MockHttpClient::new().with_response(
            SEARCH_URL,
            response(json!([
                {"_id": "a1", "_score": 7.5, "_source": {"id": "cairo-1", "city": "Cairo", "section": "Eat", "text": "Koshary"}},
                {"_id": "a2", "_score": 3.0, "_source": {"city": "Cairo", "section": "See", "text": "Giza"}}
            ])),
        );
        let store = store(client);

        let hits = store
            .search_keyword(
                KeywordQuery::new("koshary")
                    .with_filter(DocumentFilter::city("Cairo"))
                    .with_limit(5),
            )
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.id, "cairo-1");
        assert_eq!(hits[1].document.id, "a2");
        assert_eq!(hits[0].score, 7.5);

        let body = store.client.last_body().unwrap();
        assert_eq!(body["size"], 5);
        let multi_match = &body["query"]["bool"]["must"][0]["multi_match"];
        assert_eq!(multi_match["type"], "best_fields");
        assert_eq!(
            multi_match["fields"],
            json!(["city", "section", "subsection", "text"])
        );
        assert_eq!(body["query"]["bool"]["filter"][0]["term"]["city"], "Cairo");
    }

    #[tokio::test]
    async fn test_vector_search_body() {
        let client = MockHttpClient::new().with_response(SEARCH_URL, response(json!([])));
        let store = store(client);

        let query = VectorQuery::new("all_data_vector", vec![0.5, 0.5])
            .with_num_candidates(10_000)
            .with_boost(0.5)
            .with_keyword(
                KeywordQuery::new("museum")
                    .with_fields(vec![
                        FieldBoost::new(DocumentField::City, 3.0),
                        FieldBoost::unboosted(DocumentField::Text),
                    ])
                    .with_boost(0.5),
            )
            .with_filter(DocumentFilter::city("London"))
            .with_limit(5);

        assert!(store.search_vector(query).await.unwrap().is_empty());

        let body = store.client.last_body().unwrap();
        assert_eq!(body["knn"]["field"], "all_data_vector");
        assert_eq!(body["knn"]["k"], 5);
        assert_eq!(body["knn"]["num_candidates"], 10_000);
        assert_eq!(body["knn"]["boost"], 0.5);
        assert_eq!(body["knn"]["filter"]["term"]["city"], "London");
        let multi_match = &body["query"]["bool"]["must"][0]["multi_match"];
        assert_eq!(multi_match["fields"][0], "city^3");
        assert_eq!(multi_match["boost"], 0.5);
        assert_eq!(body["query"]["bool"]["filter"][0]["term"]["city"], "London");
    }

    #[tokio::test]
    async fn test_no_filter_clause_without_city() {
        let client = MockHttpClient::new().with_response(SEARCH_URL, response(json!([])));
        let store = store(client);

        store.search_keyword(KeywordQuery::new("tea")).await.unwrap();

        let body = store.client.last_body().unwrap();
        assert_eq!(body["query"]["bool"]["filter"], json!([]));
    }

    #[tokio::test]
    async fn test_hybrid_fuses_two_searches() {
        let client = MockHttpClient::new().with_response(
            SEARCH_URL,
            response(json!([
                {"_id": "x", "_score": 1.0, "_source": {"id": "rome-1", "city": "Rome", "section": "Eat", "text": "Pizza"}}
            ])),
        );
        let store = store(client);

        let query = HybridQuery {
            dense: crate::domain::knowledge_base::DenseSpec {
                field: "jina-small".to_string(),
                vector: Some(vec![1.0]),
                num_candidates: 400,
            },
            sparse: crate::domain::knowledge_base::SparseSpec {
                field: "bm25".to_string(),
                text: "pizza".to_string(),
            },
            filter: DocumentFilter::city("Rome"),
            fan_out: 25,
            limit: 5,
            rrf_k: 60.0,
        };

        let hits = store.search_hybrid(query).await.unwrap();

        let requests = store.client.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().any(|(_, body)| body["knn"]["num_candidates"] == 400));
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 2.0 / 61.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_search_error_propagates() {
        let client = MockHttpClient::new().with_status(SEARCH_URL, 503, "unavailable");
        let store = store(client);

        let err = store.search_keyword(KeywordQuery::new("tea")).await.unwrap_err();
        assert!(matches!(err, DomainError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_health_check() {
        let client = MockHttpClient::new().with_response(
            "http://localhost:9200/_cluster/health",
            json!({"cluster_name": "es", "status": "yellow"}),
        );
        assert!(store(client).health_check().await.unwrap());
    }
}
