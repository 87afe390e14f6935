//! Prompt template parsing and rendering
//!
//! Supports variable syntax: `${var:variable-name:default-value}`
//! - `${var:name}` - Required variable, error if not provided
//! - `${var:name:default}` - Optional variable with default value
//!
//! Rendering is a single pass over the template: substituted values are
//! never scanned for placeholders.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

/// Regex to match variable patterns: ${var:name} or ${var:name:default}
static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{var:([a-zA-Z0-9][-_a-zA-Z0-9]*)(?::([^}]*))?\}").unwrap()
});

/// Template processing errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemplateError {
    #[error("Missing required variable: {name}")]
    MissingVariable { name: String },

    #[error("Unknown template variable: {name}")]
    UnknownVariable { name: String },
}

/// A parsed variable from a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptVariable {
    pub name: String,
    pub default: Option<String>,
}

impl PromptVariable {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// A parsed prompt template
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    content: String,
    variables: Vec<PromptVariable>,
}

impl PromptTemplate {
    /// Parse a template string and extract its variables
    pub fn parse(content: impl Into<String>) -> Self {
        let content = content.into();
        let mut seen = HashSet::new();

        let variables = VARIABLE_PATTERN
            .captures_iter(&content)
            .filter_map(|cap| {
                let name = cap.get(1)?.as_str().to_string();
                if !seen.insert(name.clone()) {
                    return None;
                }
                Some(PromptVariable {
                    name,
                    default: cap.get(2).map(|m| m.as_str().to_string()),
                })
            })
            .collect();

        Self { content, variables }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn variables(&self) -> &[PromptVariable] {
        &self.variables
    }

    /// Render the template with provided values
    pub fn render(&self, values: &HashMap<&str, &str>) -> Result<String, TemplateError> {
        if let Some(missing) = self
            .variables
            .iter()
            .find(|v| v.is_required() && !values.contains_key(v.name.as_str()))
        {
            return Err(TemplateError::MissingVariable {
                name: missing.name.clone(),
            });
        }

        Ok(self.fill(values))
    }

    /// Render without checking required variables; a missing value becomes
    /// its default, or the empty string
    pub fn fill(&self, values: &HashMap<&str, &str>) -> String {
        VARIABLE_PATTERN
            .replace_all(&self.content, |cap: &Captures<'_>| match values.get(&cap[1]) {
                Some(value) => (*value).to_string(),
                None => cap.get(2).map_or("", |m| m.as_str()).to_string(),
            })
            .into_owned()
    }
}
