use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Trait for generative model backends
///
/// Implementations must report failures distinctly:
/// [`DomainError::ModelUnavailable`] when the backend does not know the model,
/// [`DomainError::EmptyResponse`] when it answered with no content, and
/// [`DomainError::Provider`] / [`DomainError::HttpStatus`] for transport errors.
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
