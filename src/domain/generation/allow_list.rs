//! Models the pipeline is allowed to call

use serde::{Deserialize, Serialize};

use super::GenerationError;

/// Default chat models
pub const DEFAULT_MODELS: [&str; 4] = [
    "mistral-medium-2508",
    "ministral-8b-latest",
    "mistral-small-latest",
    "open-mixtral-8x7b",
];

/// Closed set of model names accepted for generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelAllowList {
    models: Vec<String>,
}

impl Default for ModelAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_MODELS.iter().map(|m| m.to_string()))
    }
}

impl ModelAllowList {
    pub fn new(models: impl IntoIterator<Item = String>) -> Self {
        let mut list: Vec<String> = Vec::new();
        for model in models {
            if !list.contains(&model) {
                list.push(model);
            }
        }
        Self { models: list }
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    /// Fail with [`GenerationError::InvalidModelSelection`] unless allowed
    pub fn ensure(&self, model: &str) -> Result<(), GenerationError> {
        if self.contains(model) {
            Ok(())
        } else {
            Err(GenerationError::InvalidModelSelection {
                model: model.to_string(),
                allowed: self.models.clone(),
            })
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_models() {
        let list = ModelAllowList::default();
        assert_eq!(list.models().len(), 4);
        assert!(list.contains("open-mixtral-8x7b"));
        assert!(!list.contains("gpt-4"));
    }

    #[test]
    fn test_ensure_reports_allowed_models() {
        let list = ModelAllowList::new(vec!["a".to_string(), "b".to_string(), "a".to_string()]);

        match list.ensure("c").unwrap_err() {
            GenerationError::InvalidModelSelection { model, allowed } => {
                assert_eq!(model, "c");
                assert_eq!(allowed, vec!["a", "b"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(list.ensure("b").is_ok());
    }
}
