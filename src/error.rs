//! AEOS error types

use thiserror::Error;

use crate::division::DivisionId;
use crate::tools::ToolError;
use crate::workflow::WorkflowName;

/// Errors that can occur while dispatching a request
#[derive(Debug, Error)]
pub enum AeosError {
    /// Request is missing fields or carries unusable values
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Division id that no registry entry answers to
    #[error("Unknown division: {0}")]
    UnknownDivision(String),

    /// Simulated tool error
    #[error("Tool error: {0}")]
    ToolError(#[from] ToolError),

    /// A collaboration step failed; the remaining steps were not run
    #[error("Workflow {workflow} failed at step {step} ({division}): {message}")]
    StepFailed {
        workflow: WorkflowName,
        step: usize,
        division: DivisionId,
        message: String,
    },

    /// A division invocation exceeded the configured step timeout
    #[error("Division {division} timed out after {timeout_ms}ms")]
    StepTimeout { division: DivisionId, timeout_ms: u64 },

    /// Nothing to aggregate
    #[error("No division results to aggregate")]
    EmptyAggregate,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AeosError {
    /// Whether the failure was caused by the caller rather than the engine
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AeosError::InvalidRequest(_) | AeosError::UnknownDivision(_)
        )
    }
}

impl From<serde_json::Error> for AeosError {
    fn from(e: serde_json::Error) -> Self {
        AeosError::InvalidRequest(e.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, AeosError>;
