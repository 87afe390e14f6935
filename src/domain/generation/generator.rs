//! Single-call generation with latency and token accounting

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::allow_list::ModelAllowList;
use crate::domain::DomainError;
use crate::domain::llm::{LlmProvider, LlmRequest, LlmResponseFormat, Usage};

/// Errors raised while generating
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Unknown model choice: {model}. Available models: {}", .allowed.join(", "))]
    InvalidModelSelection { model: String, allowed: Vec<String> },

    #[error("Generation with {model} failed: {source}")]
    Backend {
        model: String,
        #[source]
        source: DomainError,
    },
}

/// Token counters reported by the backend, each possibly absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

impl From<Option<Usage>> for TokenUsage {
    fn from(usage: Option<Usage>) -> Self {
        usage
            .map(|u| Self {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default()
    }
}

/// Result of one generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub answer: String,
    pub usage: TokenUsage,
    /// Wall-clock seconds around the backend call, rounded to 2 decimals
    pub latency_seconds: f64,
}

/// Validates the model choice and makes exactly one backend call
#[derive(Debug, Clone)]
pub struct Generator {
    provider: Arc<dyn LlmProvider>,
    allow_list: ModelAllowList,
}

impl Generator {
    pub fn new(provider: Arc<dyn LlmProvider>, allow_list: ModelAllowList) -> Self {
        Self {
            provider,
            allow_list,
        }
    }

    pub fn allow_list(&self) -> &ModelAllowList {
        &self.allow_list
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub async fn generate(
        &self,
        prompt: &str,
        model: &str,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.generate_with(prompt, model, LlmResponseFormat::Text)
            .await
    }

    /// Generate, asking the backend for the given output format
    pub async fn generate_with(
        &self,
        prompt: &str,
        model: &str,
        format: LlmResponseFormat,
    ) -> Result<GenerationOutcome, GenerationError> {
        self.allow_list.ensure(model)?;

        let mut builder = LlmRequest::builder().user(prompt);
        if format != LlmResponseFormat::Text {
            builder = builder.response_format(format);
        }

        let start = Instant::now();
        let response = self
            .provider
            .chat(model, builder.build())
            .await
            .map_err(|source| GenerationError::Backend {
                model: model.to_string(),
                source,
            })?;
        let latency_seconds = round_seconds(start.elapsed().as_secs_f64());

        let answer = response
            .content()
            .ok_or_else(|| GenerationError::Backend {
                model: model.to_string(),
                source: DomainError::empty_response(self.provider.provider_name()),
            })?
            .to_string();

        debug!(
            model = %model,
            latency = latency_seconds,
            total_tokens = ?response.usage.and_then(|u| u.total_tokens),
            "Generation completed"
        );

        Ok(GenerationOutcome {
            answer,
            usage: TokenUsage::from(response.usage),
            latency_seconds,
        })
    }
}

fn round_seconds(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}
