//! Pipeline error taxonomy

use thiserror::Error;

use crate::domain::DomainError;
use crate::domain::generation::GenerationError;
use crate::domain::retrieval::SearchStrategy;

/// Errors that abort an answer
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unknown model choice: {model}. Available models: {}", .allowed.join(", "))]
    InvalidModelSelection { model: String, allowed: Vec<String> },

    #[error("Retrieval with {strategy} failed: {source}")]
    Retrieval {
        strategy: SearchStrategy,
        #[source]
        source: DomainError,
    },

    #[error("Retrieval with {strategy} exceeded the deadline")]
    RetrievalTimeout { strategy: SearchStrategy },

    #[error("Generation with {model} failed: {source}")]
    Generation {
        model: String,
        #[source]
        source: DomainError,
    },

    #[error("Generation with {model} exceeded the deadline")]
    GenerationTimeout { model: String },

    #[error("Evaluation with {model} exceeded the deadline")]
    EvaluationTimeout { model: String },
}

impl PipelineError {
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::RetrievalTimeout { .. }
                | Self::GenerationTimeout { .. }
                | Self::EvaluationTimeout { .. }
        )
    }

    /// Short machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidModelSelection { .. } => "invalid_model",
            Self::Retrieval { .. } => "retrieval_failed",
            Self::RetrievalTimeout { .. } => "retrieval_timeout",
            Self::Generation { .. } => "generation_failed",
            Self::GenerationTimeout { .. } => "generation_timeout",
            Self::EvaluationTimeout { .. } => "evaluation_timeout",
        }
    }
}

impl From<GenerationError> for PipelineError {
    fn from(error: GenerationError) -> Self {
        match error {
            GenerationError::InvalidModelSelection { model, allowed } => {
                Self::InvalidModelSelection { model, allowed }
            }
            GenerationError::Backend { model, source } => Self::Generation { model, source },
        }
    }
}
