//! The persisted Task record and its state machine.

use crate::{EngineError, RequestContext, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Task is the persisted declaration of one long-running operation.
///
/// The engine never creates or deletes tasks; it reads them from the task
/// repository and writes back status and message. `input` is opaque to the
/// engine and is interpreted only by the driver resolved for `task_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier, assigned by the caller at creation.
    pub id: TaskId,

    /// Task type tag selecting a driver (e.g. "import").
    pub task_type: String,

    /// Current task status.
    pub status: TaskStatus,

    /// Type-specific parameters, opaque to the engine.
    pub input: Value,

    /// Identity of the caller who declared this task, passed through
    /// unmodified to the flow.
    pub owner_context: RequestContext,

    /// Result or failure explanation, set at the terminal transition.
    pub message: String,

    /// When the task was created.
    pub created_at: DateTime<Utc>,

    /// When the task record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new Task in `Pending` status, owned by the given caller.
    pub fn new(task_type: impl Into<String>, input: Value, owner_context: RequestContext) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::generate(),
            task_type: task_type.into(),
            status: TaskStatus::Pending,
            input,
            owner_context,
            message: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Mark the task as picked up by the executor.
    ///
    /// Only valid from `Pending` (or `Processing`, where it is a no-op);
    /// a terminal task never goes back to `Processing`.
    pub fn begin_processing(&mut self) -> Result<(), EngineError> {
        match self.status {
            TaskStatus::Pending | TaskStatus::Processing => {
                self.status = TaskStatus::Processing;
                self.updated_at = Utc::now();
                Ok(())
            }
            from => Err(invalid_transition(from, TaskStatus::Processing)),
        }
    }

    /// Mark the task as succeeded, with an optional result message.
    pub fn succeed(&mut self, message: impl Into<String>) -> Result<(), EngineError> {
        if self.status.is_terminal() {
            return Err(invalid_transition(self.status, TaskStatus::Success));
        }
        self.status = TaskStatus::Success;
        self.message = message.into();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark the task as failed. The explanation must be non-empty.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), EngineError> {
        if self.status.is_terminal() {
            return Err(invalid_transition(self.status, TaskStatus::Failure));
        }
        let message = message.into();
        if message.is_empty() {
            return Err(EngineError::Validation(
                "a failed task requires a non-empty message".to_string(),
            ));
        }
        self.status = TaskStatus::Failure;
        self.message = message;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn invalid_transition(from: TaskStatus, to: TaskStatus) -> EngineError {
    EngineError::InvalidStateTransition {
        from: format!("{from:?}"),
        to: format!("{to:?}"),
    }
}
