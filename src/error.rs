//! Rule engine error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to parse rule: {0}")]
    ParseError(String),

    #[error("rule evaluation failed: {0}")]
    EvaluationError(String),

    #[error("condition tree exceeds maximum depth of {0}")]
    DepthExceeded(usize),

    #[error("rule not found: {0}")]
    RuleNotFound(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;
