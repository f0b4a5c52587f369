//! The import flow: the driver for tasks of type "import".
//!
//! Creates a provisional image record, streams bytes from the validated
//! source into storage, and finalizes the image - or, when the caller's
//! authorization expires mid-flow, deletes the locations already written
//! before re-raising the failure.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use url::Url;

use imgflow_core::{EngineError, ImageId, Task, TaskId};

use crate::input::ImportInput;
use crate::registry::{Driver, DriverDeps, DriverFactory, FlowOutcome};
use crate::repo::{ImageFactory, ImageRepo, RequestContext, StorageBackend};

/// Factory for [`ImportFlow`] drivers; register it under the "import" type.
#[derive(Default)]
pub struct ImportFlowFactory;

impl DriverFactory for ImportFlowFactory {
    fn create(
        &self,
        task: &Task,
        input: ImportInput,
        deps: DriverDeps,
    ) -> Result<Arc<dyn Driver>, EngineError> {
        Ok(Arc::new(ImportFlow {
            task_id: task.id.clone(),
            input,
            context: deps.context,
            image_repo: deps.image_repo,
            image_factory: deps.image_factory,
            store: deps.store,
        }))
    }
}

/// One import run. Single-threaded within its worker slot; holds no state
/// shared with other runs.
pub struct ImportFlow {
    task_id: TaskId,
    input: ImportInput,
    context: RequestContext,
    image_repo: Arc<dyn ImageRepo>,
    image_factory: Arc<dyn ImageFactory>,
    store: Arc<dyn StorageBackend>,
}

/// Working state of one run: the provisional image, the validated source,
/// and the locations to delete if the run has to be rolled back. Never
/// persisted; dropped when the flow returns.
struct ImportFlowState {
    image_id: ImageId,
    source: Url,
    written: Vec<String>,
}

#[async_trait]
impl Driver for ImportFlow {
    async fn run(&self, task: &Task) -> Result<FlowOutcome, EngineError> {
        debug!(task_id = %task.id, source = %self.input.source, "Starting import flow");

        let mut state = self.create_provisional_image().await?;
        if let Err(err) = self.transfer(&mut state).await {
            // Nothing was committed to storage, so there is no location
            // cleanup; the provisional record is marked unusable instead.
            self.kill_image(&state.image_id).await;
            return Err(err);
        }

        match self.finalize(&state).await {
            Ok(outcome) => Ok(outcome),
            Err(EngineError::AuthorizationExpired(reason)) => {
                // Cleanup strictly precedes propagation.
                self.cleanup_locations(&state).await;
                Err(EngineError::AuthorizationExpired(reason))
            }
            Err(err) => Err(err),
        }
    }
}

impl ImportFlow {
    /// Create the image record and make its `Saving` status externally
    /// observable before any bytes move.
    async fn create_provisional_image(&self) -> Result<ImportFlowState, EngineError> {
        let mut image = self
            .image_factory
            .new_image(&self.context, self.input.image_properties.clone())
            .await?;
        self.image_repo.save(&self.context, &image).await?;

        image.begin_saving();
        self.image_repo.save(&self.context, &image).await?;

        info!(
            task_id = %self.task_id,
            image_id = %image.id,
            "Provisional image created"
        );
        Ok(ImportFlowState {
            image_id: image.id,
            source: self.input.source.clone(),
            written: Vec::new(),
        })
    }

    /// Stream bytes from the source into storage. A failure here means no
    /// location was committed, so there is nothing to clean up.
    async fn transfer(&self, state: &mut ImportFlowState) -> Result<(), EngineError> {
        let image = self.image_repo.get(&self.context, &state.image_id).await?;
        let locations = self.store.write(&self.context, &image, &state.source).await?;

        debug!(
            task_id = %self.task_id,
            image_id = %state.image_id,
            locations = locations.len(),
            "Transfer complete"
        );
        state.written = locations;
        Ok(())
    }

    /// Best-effort: mark the provisional image `Killed` after a failed
    /// transfer. A failure to record that (the context may itself be the
    /// problem) is logged, never propagated.
    async fn kill_image(&self, image_id: &ImageId) {
        let result = async {
            let mut image = self.image_repo.get(&self.context, image_id).await?;
            image.kill();
            self.image_repo.save(&self.context, &image).await
        }
        .await;
        if let Err(err) = result {
            warn!(
                task_id = %self.task_id,
                image_id = %image_id,
                error = %err,
                "Failed to mark image killed"
            );
        }
    }

    /// Reload the image, attach the written locations, and activate it.
    async fn finalize(&self, state: &ImportFlowState) -> Result<FlowOutcome, EngineError> {
        let mut image = self.image_repo.get(&self.context, &state.image_id).await?;
        image.add_locations(state.written.iter().cloned());
        image.activate();
        self.image_repo.save(&self.context, &image).await?;

        info!(task_id = %self.task_id, image_id = %image.id, "Image active");
        Ok(FlowOutcome {
            message: format!("Image {} imported", image.id),
            image_id: image.id,
        })
    }

    /// Best-effort deletion of the locations this run wrote. Operates on
    /// the run's own record of what was written, never on a stale reload.
    /// Failures are logged and never mask the error being propagated.
    async fn cleanup_locations(&self, state: &ImportFlowState) {
        for location in &state.written {
            if let Err(err) = self
                .store
                .delete_location(&self.context, &state.image_id, location)
                .await
            {
                warn!(
                    task_id = %self.task_id,
                    image_id = %state.image_id,
                    location = %location,
                    error = %err,
                    "Failed to delete storage location during rollback"
                );
            }
        }
    }
}
