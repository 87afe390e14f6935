//! LLM-as-judge relevance grading

use std::collections::HashMap;

use tracing::{debug, warn};

use super::relevance::{EvaluationOutcome, PARSE_FAILURE_EXPLANATION, decode_evaluation};
use crate::domain::generation::{GenerationError, Generator, TokenUsage};
use crate::domain::llm::LlmResponseFormat;
use crate::domain::prompt::PromptTemplate;

/// Default evaluator model
pub const DEFAULT_EVALUATOR_MODEL: &str = "open-mixtral-8x7b";

const EVALUATION_TEMPLATE: &str = r#"You are an expert evaluator for a Retrieval-Augmented Generation (RAG) system.
Your task is to analyze the relevance of the generated answer to the given question.
Based on the relevance of the generated answer, you will classify it
as "NON_RELEVANT", "PARTLY_RELEVANT", or "RELEVANT".

Here is the data for evaluation:

Question: ${var:question}
Generated Answer: ${var:answer}

Please analyze the content and context of the generated answer in relation to the question
and provide your evaluation in parsable JSON without using code blocks:

{
  "Relevance": "NON_RELEVANT" | "PARTLY_RELEVANT" | "RELEVANT",
  "Explanation": "[Provide a brief explanation for your evaluation]"
}"#;

/// Grades an answer with a second generation call
///
/// Evaluation never fails: undecodable output and backend errors both
/// yield [`Relevance::Unknown`](super::Relevance::Unknown).
#[derive(Debug, Clone)]
pub struct RelevanceEvaluator {
    generator: Generator,
    model: String,
    template: PromptTemplate,
    format: LlmResponseFormat,
}

impl RelevanceEvaluator {
    /// Create an evaluator; the model must be in the generator's allow-list
    pub fn new(generator: Generator, model: impl Into<String>) -> Result<Self, GenerationError> {
        let model = model.into();
        generator.allow_list().ensure(&model)?;

        Ok(Self {
            generator,
            model,
            template: PromptTemplate::parse(EVALUATION_TEMPLATE),
            format: LlmResponseFormat::Text,
        })
    }

    /// Ask the backend for a JSON object response
    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.format = if enabled {
            LlmResponseFormat::JsonObject
        } else {
            LlmResponseFormat::Text
        };
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt(&self, question: &str, answer: &str) -> String {
        let values = HashMap::from([("question", question), ("answer", answer)]);
        self.template.fill(&values)
    }

    pub async fn evaluate(&self, question: &str, answer: &str) -> EvaluationOutcome {
        let prompt = self.prompt(question, answer);

        let outcome = match self
            .generator
            .generate_with(&prompt, &self.model, self.format)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(model = %self.model, error = %e, "Relevance evaluation call failed");
                return EvaluationOutcome::unknown(
                    format!("Evaluation failed: {}", e),
                    TokenUsage::default(),
                );
            }
        };

        match decode_evaluation(&outcome.answer) {
            Ok((relevance, explanation)) => {
                debug!(model = %self.model, relevance = %relevance, "Answer evaluated");
                EvaluationOutcome {
                    relevance,
                    explanation,
                    usage: outcome.usage,
                }
            }
            Err(e) => {
                warn!(
                    model = %self.model,
                    error = %e,
                    "Failed to parse evaluator output: {}", outcome.answer
                );
                EvaluationOutcome::unknown(PARSE_FAILURE_EXPLANATION, outcome.usage)
            }
        }
    }
}
