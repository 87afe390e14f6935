//! Relevance labels and the evaluator's structured output

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::generation::TokenUsage;

/// Explanation used when the evaluator output cannot be decoded
pub const PARSE_FAILURE_EXPLANATION: &str = "Failed to parse evaluation";

/// Graded relevance of an answer to its question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relevance {
    Relevant,
    PartlyRelevant,
    NonRelevant,
    /// The evaluator did not produce a usable grade
    Unknown,
}

impl Relevance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevant => "RELEVANT",
            Self::PartlyRelevant => "PARTLY_RELEVANT",
            Self::NonRelevant => "NON_RELEVANT",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to decode the evaluator's reply
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationParseError {
    #[error("No JSON object in evaluator output")]
    NoJson,

    #[error("Invalid evaluator JSON: {0}")]
    InvalidJson(String),

    #[error("Unrecognised relevance label: {0}")]
    UnknownLabel(String),
}

impl FromStr for Relevance {
    type Err = EvaluationParseError;

    /// Parses one of the three grades the evaluator may emit
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "RELEVANT" => Ok(Self::Relevant),
            "PARTLY_RELEVANT" => Ok(Self::PartlyRelevant),
            "NON_RELEVANT" => Ok(Self::NonRelevant),
            other => Err(EvaluationParseError::UnknownLabel(other.to_string())),
        }
    }
}

/// Graded relevance with the evaluator's reasoning and token usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub relevance: Relevance,
    pub explanation: String,
    pub usage: TokenUsage,
}

impl EvaluationOutcome {
    pub fn unknown(explanation: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            relevance: Relevance::Unknown,
            explanation: explanation.into(),
            usage,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    #[serde(rename = "Relevance")]
    relevance: String,
    #[serde(rename = "Explanation")]
    explanation: String,
}

/// Extract the outermost JSON object from text (handles prose and markdown fences)
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Decode evaluator output into a grade and explanation
pub fn decode_evaluation(text: &str) -> Result<(Relevance, String), EvaluationParseError> {
    let json = extract_json(text).ok_or(EvaluationParseError::NoJson)?;
    let raw: RawEvaluation = serde_json::from_str(json)
        .map_err(|e| EvaluationParseError::InvalidJson(e.to_string()))?;

    Ok((raw.relevance.parse()?, raw.explanation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_serialize_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&Relevance::PartlyRelevant).unwrap(),
            "\"PARTLY_RELEVANT\""
        );
        assert_eq!(serde_json::to_string(&Relevance::Unknown).unwrap(), "\"UNKNOWN\"");
        assert_eq!(Relevance::NonRelevant.to_string(), "NON_RELEVANT");
    }

    #[test]
    fn test_decode_plain_json() {
        let (relevance, explanation) = decode_evaluation(
            r#"{"Relevance": "RELEVANT", "Explanation": "Directly answers it."}"#,
        )
        .unwrap();

        assert_eq!(relevance, Relevance::Relevant);
        assert_eq!(explanation, "Directly answers it.");
    }

    #[test]
    fn test_decode_fenced_json() {
        let text = "Here is my evaluation:\n```json\n{\"Relevance\": \"PARTLY_RELEVANT\", \"Explanation\": \"Misses prices.\"}\n```";
        let (relevance, _) = decode_evaluation(text).unwrap();
        assert_eq!(relevance, Relevance::PartlyRelevant);
    }

    #[test]
    fn test_decode_failures() {
        assert_eq!(
            decode_evaluation("I think it is relevant"),
            Err(EvaluationParseError::NoJson)
        );
        assert!(matches!(
            decode_evaluation("{\"Relevance\": RELEVANT}"),
            Err(EvaluationParseError::InvalidJson(_))
        ));
        assert!(matches!(
            decode_evaluation(r#"{"Relevance": "RELEVANT"}"#),
            Err(EvaluationParseError::InvalidJson(_))
        ));
        assert_eq!(
            decode_evaluation(r#"{"Relevance": "MAYBE", "Explanation": "?"}"#),
            Err(EvaluationParseError::UnknownLabel("MAYBE".to_string()))
        );
    }

    #[test]
    fn test_extract_json() {
        assert_eq!(extract_json("x {\"a\": 1} y"), Some("{\"a\": 1}"));
        assert_eq!(extract_json("} {"), None);
        assert_eq!(extract_json("none"), None);
    }
}
