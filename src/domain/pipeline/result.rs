//! Answer request and result types

use serde::{Deserialize, Serialize};

use crate::domain::evaluation::{EvaluationOutcome, Relevance};
use crate::domain::generation::GenerationOutcome;
use crate::domain::retrieval::{ScoredDocument, SearchStrategy};

/// One user turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub model: String,
    /// Strategy name; unknown or absent names use the default strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl AnswerRequest {
    pub fn new(question: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            city: None,
            model: model.into(),
            strategy: None,
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }
}

/// Passage that grounded the answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub city: String,
    pub heading: String,
    pub score: f64,
    pub rank: usize,
}

impl From<&ScoredDocument> for SourceRef {
    fn from(scored: &ScoredDocument) -> Self {
        Self {
            id: scored.document.id.clone(),
            city: scored.document.city.clone(),
            heading: scored.document.heading(),
            score: scored.score,
            rank: scored.rank,
        }
    }
}

/// Graded answer with the metadata of the query that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub question: String,
    pub city: Option<String>,
    pub strategy: SearchStrategy,
    pub model: String,
    pub generation: GenerationOutcome,
    pub evaluation: EvaluationOutcome,
    pub sources: Vec<SourceRef>,
    pub retrieval_seconds: f64,
}

impl AnswerResult {
    pub fn answer(&self) -> &str {
        &self.generation.answer
    }

    pub fn relevance(&self) -> Relevance {
        self.evaluation.relevance
    }

    /// Flat view in the shape stored alongside conversation history
    pub fn record(&self) -> AnswerRecord {
        AnswerRecord::from(self)
    }
}

/// Flat answer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub answer: String,
    pub response_time: f64,
    pub relevance: Relevance,
    pub relevance_explanation: String,
    pub model_used: String,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
    pub eval_prompt_tokens: Option<u32>,
    pub eval_completion_tokens: Option<u32>,
    pub eval_total_tokens: Option<u32>,
    /// Historical label of the strategy, e.g. `Qdrant`
    pub search_type: String,
}

impl From<&AnswerResult> for AnswerRecord {
    fn from(result: &AnswerResult) -> Self {
        let usage = result.generation.usage;
        let eval_usage = result.evaluation.usage;

        Self {
            answer: result.generation.answer.clone(),
            response_time: result.generation.latency_seconds,
            relevance: result.evaluation.relevance,
            relevance_explanation: result.evaluation.explanation.clone(),
            model_used: result.model.clone(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            eval_prompt_tokens: eval_usage.prompt_tokens,
            eval_completion_tokens: eval_usage.completion_tokens,
            eval_total_tokens: eval_usage.total_tokens,
            search_type: result.strategy.legacy_label().to_string(),
        }
    }
}
