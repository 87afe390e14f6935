//! Models endpoint handler

use axum::{Json, extract::State};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ModelsResponse;

/// GET /v1/models
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    debug!("Listing allowed models");

    let generator = state.pipeline.generator();
    Json(ModelsResponse::new(
        generator.allow_list().models(),
        generator.provider_name(),
        state.pipeline.evaluator().model(),
    ))
}
