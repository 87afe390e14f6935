//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    LlmRequestMetricParams, PrometheusMetrics, create_metrics_router, init_metrics,
    record_answer, record_http_request, record_llm_request, record_retrieval,
};
