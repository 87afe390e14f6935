//! Domain layer - Core business logic and entities

pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod generation;
pub mod knowledge_base;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;

pub use embedding::EmbeddingProvider;
pub use error::DomainError;
pub use evaluation::{EvaluationOutcome, Relevance, RelevanceEvaluator};
pub use generation::{GenerationError, GenerationOutcome, Generator, ModelAllowList, TokenUsage};
pub use knowledge_base::{Document, DocumentFilter, DocumentStore, IndexedDocument, StoreHit};
pub use llm::{LlmProvider, LlmRequest, LlmResponse, Message, MessageRole, Usage};
pub use pipeline::{
    AnswerPipeline, AnswerRecord, AnswerRequest, AnswerResult, PipelineError, PipelineStage,
};
pub use prompt::{PromptBuilder, PromptTemplate, TemplateError};
pub use retrieval::{
    QueryRouter, RetrievalConfig, RetrievalResult, RetrievalStrategy, ScoredDocument,
    SearchStrategy,
};
