use thiserror::Error;

/// Failure raised by an injected search or primer capability.
///
/// The orchestrator never propagates these; they are folded into the
/// tool-result message or swallowed by the primer.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
