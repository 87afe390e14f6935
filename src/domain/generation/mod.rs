//! Answer generation against an allow-listed set of models

mod allow_list;
mod generator;

pub use allow_list::{DEFAULT_MODELS, ModelAllowList};
pub use generator::{GenerationError, GenerationOutcome, Generator, TokenUsage};
