//! Relevance evaluation of generated answers

mod evaluator;
mod relevance;

pub use evaluator::{DEFAULT_EVALUATOR_MODEL, RelevanceEvaluator};
pub use relevance::{
    EvaluationOutcome, EvaluationParseError, PARSE_FAILURE_EXPLANATION, Relevance,
    decode_evaluation,
};
