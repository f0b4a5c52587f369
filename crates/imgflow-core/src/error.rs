//! Engine error taxonomy.

use thiserror::Error;

/// Errors produced by the task-execution engine and its collaborators.
///
/// Every variant is terminal at the task-record boundary: the executor
/// reconciles them into a persisted `Failure` status (or, for
/// [`EngineError::NotFound`], swallows them) rather than raising past
/// `begin_processing`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Task id unresolvable; logged and ignored at the orchestrator boundary.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad or unsupported source URI, or malformed task input.
    #[error("Invalid task input: {0}")]
    Validation(String),

    /// No driver registered for the task type.
    #[error("No driver registered for task type '{0}'")]
    DriverResolution(String),

    /// Driver construction failed for a reason the engine does not
    /// distinguish further.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Network or storage failure while transferring image bytes.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// Caller authorization expired mid-flow.
    #[error("Authorization expired: {0}")]
    AuthorizationExpired(String),

    /// Invalid task state transition.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Anything else; detail is logged, never persisted verbatim.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}
