//! Prompt construction - templates with variable support and the answer prompt builder

mod builder;
mod template;

pub use builder::{DEFAULT_ANSWER_TEMPLATE, PromptBuilder};
pub use template::{PromptTemplate, PromptVariable, TemplateError};
