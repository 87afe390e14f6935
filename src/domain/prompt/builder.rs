//! Renders retrieved passages into the answer prompt

use std::collections::HashMap;

use super::template::{PromptTemplate, TemplateError};
use crate::domain::retrieval::{RetrievalResult, ScoredDocument};

/// Default answer prompt; exactly two placeholders
pub const DEFAULT_ANSWER_TEMPLATE: &str = "You're a travel assistant. Answer the QUESTION based on the CONTEXT from the FAQ database.
Use only the facts from the CONTEXT when answering the QUESTION.

QUESTION: ${var:question}

CONTEXT:
${var:context}";

const QUESTION: &str = "question";
const CONTEXT: &str = "context";
const ENTRY_SEPARATOR: &str = "\n\n";

/// Deterministic prompt builder with no hidden state
///
/// Each passage renders as `Q: <heading>\n A: <text>`; passages are joined by
/// a blank line. An empty retrieval result yields an empty context. No token
/// budget is enforced.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: PromptTemplate,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            template: PromptTemplate::parse(DEFAULT_ANSWER_TEMPLATE),
        }
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom template; it may only reference `question` and `context`
    pub fn with_template(content: impl Into<String>) -> Result<Self, TemplateError> {
        let template = PromptTemplate::parse(content);

        if let Some(unknown) = template
            .variables()
            .iter()
            .find(|v| v.name != QUESTION && v.name != CONTEXT)
        {
            return Err(TemplateError::UnknownVariable {
                name: unknown.name.clone(),
            });
        }

        Ok(Self { template })
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Render the context block for a retrieval result
    pub fn context(&self, result: &RetrievalResult) -> String {
        result
            .documents()
            .iter()
            .map(render_entry)
            .collect::<Vec<_>>()
            .join(ENTRY_SEPARATOR)
    }

    pub fn build(&self, question: &str, result: &RetrievalResult) -> String {
        let context = self.context(result);
        let values = HashMap::from([(QUESTION, question), (CONTEXT, context.as_str())]);
        self.template.fill(&values)
    }
}

fn render_entry(scored: &ScoredDocument) -> String {
    format!(
        "Q: {}\n A: {}",
        scored.document.heading(),
        scored.document.text
    )
}
