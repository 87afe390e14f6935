//! Answer pipeline - query in, graded answer out

mod coordinator;
mod error;
mod result;

pub use coordinator::{AnswerPipeline, DEFAULT_DEADLINE, PipelineStage};
pub use error::PipelineError;
pub use result::{AnswerRecord, AnswerRequest, AnswerResult, SourceRef};
