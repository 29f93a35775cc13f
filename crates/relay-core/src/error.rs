use relay_llm::LlmError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Model {0} not found")]
    ModelNotFound(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("No models available")]
    NoModels,
}

pub type Result<T> = std::result::Result<T, ServiceError>;
