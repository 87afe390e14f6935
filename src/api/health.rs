//! Health check endpoints for Kubernetes probes

use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use futures::future::join_all;
use serde::Serialize;

use super::state::{AppState, StoreProbe};

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Returns 200 while the process is running
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Probes every configured store
///
/// A failing required store makes the service unhealthy; any other failing
/// store only degrades it.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();

    let results = join_all(state.stores.iter().map(check_store)).await;

    let mut overall_status = HealthStatus::Healthy;
    let mut checks = Vec::with_capacity(results.len());
    for (check, required) in results {
        if check.status != HealthStatus::Healthy {
            overall_status = if required {
                HealthStatus::Unhealthy
            } else if overall_status == HealthStatus::Healthy {
                HealthStatus::Degraded
            } else {
                overall_status
            };
        }
        checks.push(check);
    }

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness check - simple check to verify the service is running
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn check_store(probe: &StoreProbe) -> (HealthCheck, bool) {
    let start = Instant::now();

    let (status, message) = match probe.store.health_check().await {
        Ok(true) => (HealthStatus::Healthy, None),
        Ok(false) => (HealthStatus::Unhealthy, Some("store reported unhealthy".to_string())),
        Err(e) => (HealthStatus::Unhealthy, Some(e.to_string())),
    };

    let check = HealthCheck {
        name: probe.name.clone(),
        status,
        message,
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    (check, probe.required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::api::state::mock;
    use crate::domain::DomainError;
    use crate::domain::knowledge_base::MockDocumentStore;

    fn failing_store() -> Arc<MockDocumentStore> {
        let mut store = MockDocumentStore::new();
        store
            .expect_health_check()
            .returning(|| Err(DomainError::provider("qdrant", "connection refused")));
        Arc::new(store)
    }

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn test_health_response_omits_empty_fields() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "1.0.0".to_string(),
            checks: None,
            latency_ms: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(!json.contains("checks"));
    }

    #[tokio::test]
    async fn test_ready_with_healthy_store() {
        let response = ready_check(State(mock::state())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_degraded_by_optional_store() {
        let mut state = mock::state();
        state
            .stores
            .push(StoreProbe::new("qdrant", failing_store(), false));

        let response = ready_check(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_unhealthy_when_required_store_fails() {
        let mut state = mock::state();
        state.stores = vec![StoreProbe::new("qdrant", failing_store(), true)];

        let response = ready_check(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
