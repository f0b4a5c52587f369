//! Caller identity attached to a task.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque caller identity and authorization context.
///
/// Recorded on the task at creation and passed through to collaborators
/// unmodified; the engine never branches on its contents. Collaborators may
/// reject calls made under an expired context with
/// `EngineError::AuthorizationExpired`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Correlation id for this request.
    pub request_id: Uuid,

    /// Opaque owner identity.
    pub owner: String,
}

impl RequestContext {
    /// Create a context for the given owner.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            owner: owner.into(),
        }
    }
}
