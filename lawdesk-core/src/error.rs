use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LawdeskError {
    #[error("LLM provider failed: {0}")]
    Provider(String),
    #[error("Parsing failed on output '{output}': {reason}")]
    ParseFailed { output: String, reason: String },
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
