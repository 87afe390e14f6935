//! Answer endpoint handler

use axum::{Json, extract::State};
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::types::{AnswerApiRequest, ApiError, ValidatedJson};
use crate::domain::{AnswerResult, PipelineError};
use crate::infrastructure::observability::{
    LlmRequestMetricParams, record_answer, record_llm_request,
};

/// POST /v1/answer
pub async fn create_answer(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<AnswerApiRequest>,
) -> Result<Json<AnswerResult>, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let pipeline = &state.pipeline;

    let answer_request = request.to_domain();
    if answer_request.question.is_empty() {
        return Err(ApiError::bad_request("Question cannot be blank").with_param("question"));
    }

    info!(
        request_id = %request_id,
        model = %answer_request.model,
        city = ?answer_request.city,
        strategy = ?answer_request.strategy,
        "Processing answer request"
    );

    let deadline = Instant::now() + request.deadline().unwrap_or_else(|| pipeline.deadline());
    let provider = pipeline.generator().provider_name();
    let model = answer_request.model.clone();

    match pipeline.answer_by(answer_request, deadline).await {
        Ok(result) => {
            record_answer(&result, provider, pipeline.evaluator().model());
            Ok(Json(result))
        }
        Err(e) => {
            warn!(request_id = %request_id, code = e.code(), error = %e, "Answer request failed");
            if matches!(
                e,
                PipelineError::Generation { .. } | PipelineError::GenerationTimeout { .. }
            ) {
                record_llm_request(LlmRequestMetricParams {
                    provider,
                    model: &model,
                    purpose: "generation",
                    duration: None,
                    success: false,
                    input_tokens: None,
                    output_tokens: None,
                });
            }
            Err(ApiError::from(e))
        }
    }
}
