//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod http;
pub mod knowledge_base;
pub mod llm;
pub mod logging;
pub mod observability;
