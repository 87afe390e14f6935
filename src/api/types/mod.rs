//! API request, response and error types

pub mod answer;
pub mod error;
pub mod json;

pub use answer::{AnswerApiRequest, ModelEntry, ModelsResponse};
pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::ValidatedJson;
