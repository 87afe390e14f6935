//! Answer endpoint request and model listing types

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::AnswerRequest;

/// Body of `POST /v1/answer`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnswerApiRequest {
    #[validate(length(min = 1, max = 2000, message = "must be between 1 and 2000 characters"))]
    pub question: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub city: Option<String>,
    #[validate(length(min = 1, message = "is required"))]
    pub model: String,
    pub strategy: Option<String>,
    /// Overrides the configured pipeline deadline
    #[validate(range(min = 1, max = 600000, message = "must be between 1 and 600000"))]
    pub deadline_ms: Option<u64>,
}

impl AnswerApiRequest {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    pub fn to_domain(&self) -> AnswerRequest {
        AnswerRequest {
            question: self.question.trim().to_string(),
            city: self.city.clone(),
            model: self.model.clone(),
            strategy: self.strategy.clone(),
        }
    }
}

/// Response of `GET /v1/models`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<ModelEntry>,
    pub evaluator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub object: String,
    pub owned_by: String,
}

impl ModelsResponse {
    pub fn new(models: &[String], owner: &str, evaluator: impl Into<String>) -> Self {
        Self {
            object: "list".to_string(),
            data: models
                .iter()
                .map(|id| ModelEntry {
                    id: id.clone(),
                    object: "model".to_string(),
                    owned_by: owner.to_string(),
                })
                .collect(),
            evaluator: evaluator.into(),
        }
    }
}
