//! Status enums for Tasks and Images.

use serde::{Deserialize, Serialize};

/// Status of a Task.
///
/// Transitions are monotonic: `Pending -> Processing -> {Success, Failure}`.
/// The terminal states never revert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task created but not yet picked up by the executor.
    #[default]
    Pending,
    /// Task has been dispatched to a flow.
    Processing,
    /// Task completed successfully.
    Success,
    /// Task failed; the task record carries the explanation.
    Failure,
}

impl TaskStatus {
    /// Returns true if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

/// Domain status of an Image record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageStatus {
    /// Image record exists but no data transfer has started.
    #[default]
    Queued,
    /// Data transfer is in progress; the record is visibly incomplete.
    Saving,
    /// Image data is fully stored and the image is usable.
    Active,
    /// Import failed; the record is unusable.
    Killed,
}

impl ImageStatus {
    /// Returns true if image data is fully stored.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}
