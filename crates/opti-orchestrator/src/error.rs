//! Error types for the orchestration core.

use opti_model::ValidationError;
use opti_store::StoreError;

/// Orchestrator error type that wraps errors from the model and store
/// crates and provides a unified interface for the request-handling layer.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("run id cannot be empty")]
    EmptyRunId,

    #[error("run {run_id} has no backend job attached")]
    NoJobAttached { run_id: String },

    #[error("backend error: {message}")]
    Backend { message: String },
}

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
