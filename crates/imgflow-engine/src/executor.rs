//! The task executor: public entry point of the engine.
//!
//! `begin_processing` loads the task, resolves its driver, runs the flow
//! under a worker pool, and reconciles the outcome into the persisted task
//! record. It never raises past its own boundary; callers observe failure
//! only by reading the task record afterwards.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use imgflow_core::{EngineError, Task, TaskId};

use crate::config::ExecutorConfig;
use crate::pool::PoolProvider;
use crate::registry::{DriverDeps, DriverRegistry};
use crate::repo::{ImageFactory, ImageRepo, StorageBackend, TaskRepo};

/// Operator-facing message for failures whose cause stays in the logs.
const INTERNAL_ERROR_MESSAGE: &str = "Task failed due to Internal Error";

/// Orchestrates the execution of persisted tasks.
///
/// The executor itself carries no caller identity; each task brings its own
/// `owner_context`, and the flow runs under that.
pub struct TaskExecutor {
    registry: Arc<DriverRegistry>,
    task_repo: Arc<dyn TaskRepo>,
    image_repo: Arc<dyn ImageRepo>,
    image_factory: Arc<dyn ImageFactory>,
    store: Arc<dyn StorageBackend>,
    pool: PoolProvider,
}

impl TaskExecutor {
    /// Build an executor. The worker-pool capability probe happens here,
    /// once; the config is validated at construction and immutable for the
    /// executor's lifetime.
    pub fn new(
        config: ExecutorConfig,
        registry: Arc<DriverRegistry>,
        task_repo: Arc<dyn TaskRepo>,
        image_repo: Arc<dyn ImageRepo>,
        image_factory: Arc<dyn ImageFactory>,
        store: Arc<dyn StorageBackend>,
    ) -> Result<Self, EngineError> {
        let pool = PoolProvider::new(&config)?;
        info!(
            mode = ?config.mode,
            max_workers = config.max_workers,
            "Task executor initialized"
        );
        Ok(Self {
            registry,
            task_repo,
            image_repo,
            image_factory,
            store,
            pool,
        })
    }

    /// Process one task to a terminal status.
    ///
    /// Never returns an error and never panics the caller: a task that
    /// cannot be loaded is ignored, and every failure mode ends as a
    /// persisted `Failure` status on the task record.
    pub async fn begin_processing(&self, task_id: &TaskId) {
        let mut task = match self.task_repo.get(task_id).await {
            Ok(task) => task,
            Err(EngineError::NotFound(_)) => {
                // Without a record there is no way to report status.
                debug!(task_id = %task_id, "Task not found, nothing to process");
                return;
            }
            Err(err) => {
                error!(task_id = %task_id, error = %err, "Failed to load task");
                return;
            }
        };

        debug!(
            task_id = %task.id,
            task_type = %task.task_type,
            "Executor picked up task"
        );

        if let Err(err) = self.mark_processing(&mut task).await {
            warn!(task_id = %task.id, error = %err, "Task is not dispatchable");
            return;
        }

        // The flow runs under the task's own caller identity.
        let deps = DriverDeps {
            context: task.owner_context.clone(),
            task_repo: self.task_repo.clone(),
            image_repo: self.image_repo.clone(),
            image_factory: self.image_factory.clone(),
            store: self.store.clone(),
        };
        let driver = match self.registry.resolve(&task, deps) {
            Ok(driver) => driver,
            Err(err) => {
                error!(task_id = %task.id, error = %err, "Failed to resolve driver");
                self.finish_failed(task, err.to_string()).await;
                return;
            }
        };

        let pool = self.pool.acquire();
        let flow_task = task.clone();
        let result = pool.submit(async move { driver.run(&flow_task).await }).await;

        match result {
            Ok(outcome) => {
                info!(
                    task_id = %task.id,
                    image_id = %outcome.image_id,
                    "Task succeeded"
                );
                self.finish_succeeded(task, outcome.message).await;
            }
            Err(
                err @ (EngineError::Validation(_)
                | EngineError::Transfer(_)
                | EngineError::AuthorizationExpired(_)),
            ) => {
                error!(task_id = %task.id, error = %err, "Failed to execute task");
                self.finish_failed(task, err.to_string()).await;
            }
            Err(err) => {
                // Detail stays in the logs; the record gets the generic
                // operator-facing message.
                error!(task_id = %task.id, error = %err, "Failed to execute task");
                self.finish_failed(task, INTERNAL_ERROR_MESSAGE).await;
            }
        }
        pool.shutdown();
    }

    /// Persist the `Processing` status before dispatching the flow.
    async fn mark_processing(&self, task: &mut Task) -> Result<(), EngineError> {
        task.begin_processing()?;
        self.task_repo.save(task).await
    }

    async fn finish_succeeded(&self, mut task: Task, message: String) {
        if let Err(err) = task.succeed(message) {
            error!(task_id = %task.id, error = %err, "Cannot mark task succeeded");
            return;
        }
        self.persist_terminal(&task).await;
    }

    async fn finish_failed(&self, mut task: Task, message: impl Into<String>) {
        if let Err(err) = task.fail(message) {
            error!(task_id = %task.id, error = %err, "Cannot mark task failed");
            return;
        }
        self.persist_terminal(&task).await;
    }

    async fn persist_terminal(&self, task: &Task) {
        if let Err(err) = self.task_repo.save(task).await {
            error!(
                task_id = %task.id,
                error = %err,
                "Failed to persist terminal task status"
            );
        }
    }
}
