use thiserror::Error;

/// Core domain errors raised by backends and collaborators
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("HTTP {status} from {provider}: {body}")]
    HttpStatus {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Model '{model}' is not available on {provider}")]
    ModelUnavailable { provider: String, model: String },

    #[error("Empty response from {provider}")]
    EmptyResponse { provider: String },

    #[error("Unsupported operation on {backend}: {operation}")]
    Unsupported { backend: String, operation: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn http_status(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            provider: provider.into(),
            status,
            body: body.into(),
        }
    }

    pub fn model_unavailable(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            provider: provider.into(),
            model: model.into(),
        }
    }

    pub fn empty_response(provider: impl Into<String>) -> Self {
        Self::EmptyResponse {
            provider: provider.into(),
        }
    }

    pub fn unsupported(backend: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            backend: backend.into(),
            operation: operation.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn knowledge_base(message: impl Into<String>) -> Self {
        Self::KnowledgeBase(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Document 'cairo-1' not found");
        assert_eq!(error.to_string(), "Not found: Document 'cairo-1' not found");
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Invalid input");
        assert_eq!(error.to_string(), "Validation error: Invalid input");
    }

    #[test]
    fn test_generative_failures_are_distinct() {
        let unknown = DomainError::model_unavailable("mistral", "mistral-huge");
        let transport = DomainError::provider("http", "connection reset");
        let empty = DomainError::empty_response("mistral");

        assert_eq!(
            unknown.to_string(),
            "Model 'mistral-huge' is not available on mistral"
        );
        assert_eq!(transport.to_string(), "Provider error: http - connection reset");
        assert_eq!(empty.to_string(), "Empty response from mistral");
    }

    #[test]
    fn test_unsupported_error() {
        let error = DomainError::unsupported("qdrant", "search_keyword");
        assert_eq!(
            error.to_string(),
            "Unsupported operation on qdrant: search_keyword"
        );
    }
}
