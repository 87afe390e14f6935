//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use super::config::MetricsConfig;
use crate::domain::{AnswerResult, SearchStrategy, TokenUsage};

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("musafir_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router serving at `path`
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Parameters for LLM request metrics
pub struct LlmRequestMetricParams<'a> {
    pub provider: &'a str,
    pub model: &'a str,
    /// `generation` or `evaluation`
    pub purpose: &'a str,
    pub duration: Option<Duration>,
    pub success: bool,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
}

/// Record an LLM request metric
pub fn record_llm_request(params: LlmRequestMetricParams) {
    let labels = [
        ("provider", params.provider.to_string()),
        ("model", params.model.to_string()),
        ("purpose", params.purpose.to_string()),
        ("status", if params.success { "success" } else { "error" }.to_string()),
    ];

    counter!("llm_requests_total", &labels).increment(1);

    if let Some(duration) = params.duration {
        histogram!("llm_request_duration_seconds", &labels).record(duration.as_secs_f64());
    }

    if let Some(tokens) = params.input_tokens {
        counter!("llm_input_tokens_total", &labels).increment(tokens);
    }

    if let Some(tokens) = params.output_tokens {
        counter!("llm_output_tokens_total", &labels).increment(tokens);
    }

    if !params.success {
        counter!("llm_errors_total", &labels).increment(1);
    }
}

/// Record one retrieval by strategy
pub fn record_retrieval(
    strategy: SearchStrategy,
    duration: Duration,
    success: bool,
    documents: usize,
) {
    let labels = [
        ("strategy", strategy.as_str().to_string()),
        ("status", if success { "success" } else { "error" }.to_string()),
    ];

    counter!("retrieval_requests_total", &labels).increment(1);
    histogram!("retrieval_duration_seconds", &labels).record(duration.as_secs_f64());

    if success {
        histogram!("retrieval_documents", "strategy" => strategy.as_str()).record(documents as f64);
    }
}

/// Record the retrieval and both model calls of a completed answer
pub fn record_answer(result: &AnswerResult, provider: &str, evaluator_model: &str) {
    record_retrieval(
        result.strategy,
        Duration::from_secs_f64(result.retrieval_seconds.max(0.0)),
        true,
        result.sources.len(),
    );

    record_llm_request(LlmRequestMetricParams {
        provider,
        model: &result.model,
        purpose: "generation",
        duration: Some(Duration::from_secs_f64(result.generation.latency_seconds.max(0.0))),
        success: true,
        input_tokens: prompt_tokens(&result.generation.usage),
        output_tokens: completion_tokens(&result.generation.usage),
    });

    record_llm_request(LlmRequestMetricParams {
        provider,
        model: evaluator_model,
        purpose: "evaluation",
        duration: None,
        success: result.evaluation.relevance.is_known(),
        input_tokens: prompt_tokens(&result.evaluation.usage),
        output_tokens: completion_tokens(&result.evaluation.usage),
    });

    counter!("answers_total", "relevance" => result.evaluation.relevance.as_str()).increment(1);
}

fn prompt_tokens(usage: &TokenUsage) -> Option<u64> {
    usage.prompt_tokens.map(u64::from)
}

fn completion_tokens(usage: &TokenUsage) -> Option<u64> {
    usage.completion_tokens.map(u64::from)
}

/// Sanitize URL path for metric labels (remove IDs, limit cardinality)
fn sanitize_path(path: &str) -> String {
    let path = UUID_SEGMENT.replace_all(path, "{id}");
    let path = NUMERIC_SEGMENT.replace_all(&path, "/{id}$1");

    path.chars().take(50).collect()
}
