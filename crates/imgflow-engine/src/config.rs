//! Executor configuration.

use imgflow_core::EngineError;

/// How the engine runs flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Flows run synchronously on the calling task.
    Serial,
    /// Flows run on a bounded pool of worker slots.
    Parallel,
}

/// Executor configuration.
///
/// Constructed once by the embedding process and passed into
/// [`TaskExecutor::new`]; immutable for the executor's lifetime. No engine
/// behavior is configurable beyond these two values.
///
/// [`TaskExecutor::new`]: crate::executor::TaskExecutor::new
#[derive(Debug, Clone, Copy)]
pub struct ExecutorConfig {
    /// The mode in which the engine will run.
    pub mode: EngineMode,

    /// The number of flows executed at the same time by the engine.
    /// Only meaningful when the mode is parallel.
    pub max_workers: usize,
}

impl ExecutorConfig {
    /// Create a validated config. `max_workers` must be at least 1.
    pub fn new(mode: EngineMode, max_workers: usize) -> Result<Self, EngineError> {
        if max_workers == 0 {
            return Err(EngineError::Validation(
                "max_workers must be at least 1".to_string(),
            ));
        }
        Ok(Self { mode, max_workers })
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            mode: EngineMode::Parallel,
            max_workers: 10,
        }
    }
}
