//! Application state shared by the handlers

use std::sync::Arc;

use crate::domain::{AnswerPipeline, DocumentStore};

/// A configured store probed by the readiness check
#[derive(Debug, Clone)]
pub struct StoreProbe {
    pub name: String,
    pub store: Arc<dyn DocumentStore>,
    /// The default strategy reads from this store
    pub required: bool,
}

impl StoreProbe {
    pub fn new(name: impl Into<String>, store: Arc<dyn DocumentStore>, required: bool) -> Self {
        Self {
            name: name.into(),
            store,
            required,
        }
    }
}

/// Application state containing the answer pipeline and its stores
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Arc<AnswerPipeline>,
    pub stores: Vec<StoreProbe>,
}

impl AppState {
    pub fn new(pipeline: Arc<AnswerPipeline>, stores: Vec<StoreProbe>) -> Self {
        Self { pipeline, stores }
    }
}
