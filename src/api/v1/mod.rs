//! v1 API endpoints

pub mod answer;
pub mod models;

use axum::{
    Router,
    routing::{get, post},
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/answer", post(answer::create_answer))
        .route("/models", get(models::list_models))
}
