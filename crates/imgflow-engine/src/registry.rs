//! Driver registry: resolves a task-type string to a flow implementation.
//!
//! The registry is populated once at process start (by whatever discovery
//! mechanism the embedding process uses) and is read-only afterwards. The
//! engine only ever calls [`DriverRegistry::resolve`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use imgflow_core::{EngineError, ImageId, Task};

use crate::input::ImportInput;
use crate::repo::{ImageFactory, ImageRepo, RequestContext, StorageBackend, TaskRepo};

/// Terminal outcome of one successful flow run.
#[derive(Debug, Clone)]
pub struct FlowOutcome {
    /// The image the flow produced.
    pub image_id: ImageId,

    /// Human-readable result message for the task record.
    pub message: String,
}

/// A pluggable strategy implementing the steps for one task type.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Execute the flow for one task run.
    async fn run(&self, task: &Task) -> Result<FlowOutcome, EngineError>;
}

/// Collaborators handed to a driver factory at resolution time.
///
/// This is the minimum set a flow may need; a concrete driver keeps only
/// what it actually uses.
#[derive(Clone)]
pub struct DriverDeps {
    /// Caller identity, passed through unmodified.
    pub context: RequestContext,

    /// Accessor for persisted task records.
    pub task_repo: Arc<dyn TaskRepo>,

    /// Accessor for persisted image records.
    pub image_repo: Arc<dyn ImageRepo>,

    /// Factory for new image records.
    pub image_factory: Arc<dyn ImageFactory>,

    /// Physical image-bytes storage backend.
    pub store: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for dyn Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Driver")
    }
}

/// Constructor for one task type's driver.
///
/// The factory receives input that already passed unpacking and URI
/// validation; it only has to wire the flow together.
pub trait DriverFactory: Send + Sync {
    /// Build the driver for one task run.
    fn create(
        &self,
        task: &Task,
        input: ImportInput,
        deps: DriverDeps,
    ) -> Result<Arc<dyn Driver>, EngineError>;
}

/// Process-wide, read-mostly mapping from task-type string to driver factory.
#[derive(Default)]
pub struct DriverRegistry {
    factories: HashMap<String, Arc<dyn DriverFactory>>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for a task type. Later registrations for the same
    /// type replace earlier ones.
    pub fn register(&mut self, task_type: impl Into<String>, factory: Arc<dyn DriverFactory>) {
        self.factories.insert(task_type.into(), factory);
    }

    /// Resolve a driver for the task's declared type.
    ///
    /// Resolution order: unpack the task input and validate its source URI
    /// first, then look up the factory, then instantiate. Validation is a
    /// pre-condition, not a flow step: a malformed task fails fast without
    /// consuming a worker slot, and before the type is even looked up. The
    /// type must match a registered factory exactly; an unknown type is an
    /// error, not a silent no-op. Any construction failure from the factory
    /// is normalized to [`EngineError::Unsupported`] without inferring
    /// finer causes.
    pub fn resolve(&self, task: &Task, deps: DriverDeps) -> Result<Arc<dyn Driver>, EngineError> {
        let input = ImportInput::from_task(task)?;

        let factory = self
            .factories
            .get(task.task_type.as_str())
            .ok_or_else(|| EngineError::DriverResolution(task.task_type.clone()))?;

        factory
            .create(task, input, deps)
            .map_err(|err| EngineError::Unsupported(err.to_string()))
    }
}
