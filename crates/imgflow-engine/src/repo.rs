//! Collaborator interfaces consumed by the engine.
//!
//! These are implemented elsewhere (database layer, storage plugins); the
//! engine only ever talks to them through these traits.

use async_trait::async_trait;
use serde_json::{Map, Value};
use url::Url;

use imgflow_core::{EngineError, Image, ImageId, Task, TaskId};

pub use imgflow_core::RequestContext;

/// Accessor for persisted task records.
///
/// `save` is idempotent; last-write-wins is acceptable. The repository is
/// responsible for ensuring a task id is not concurrently dispatched twice.
/// No caller context is needed here: the task record carries its own
/// `owner_context`.
#[async_trait]
pub trait TaskRepo: Send + Sync {
    /// Load a task by id. `EngineError::NotFound` if absent.
    async fn get(&self, task_id: &TaskId) -> Result<Task, EngineError>;

    /// Persist the task record.
    async fn save(&self, task: &Task) -> Result<(), EngineError>;
}

/// Accessor for persisted image records.
#[async_trait]
pub trait ImageRepo: Send + Sync {
    /// Load an image by id.
    async fn get(&self, ctx: &RequestContext, image_id: &ImageId) -> Result<Image, EngineError>;

    /// Persist the image record.
    async fn save(&self, ctx: &RequestContext, image: &Image) -> Result<(), EngineError>;
}

/// Factory for new image records.
#[async_trait]
pub trait ImageFactory: Send + Sync {
    /// Construct a new in-memory image record from declared properties.
    /// Does not persist it.
    async fn new_image(
        &self,
        ctx: &RequestContext,
        properties: Map<String, Value>,
    ) -> Result<Image, EngineError>;
}

/// Physical image-bytes storage backend.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Stream bytes from `source` into storage for `image`, returning the
    /// locations written. `EngineError::Transfer` on stream failure.
    async fn write(
        &self,
        ctx: &RequestContext,
        image: &Image,
        source: &Url,
    ) -> Result<Vec<String>, EngineError>;

    /// Delete one storage location previously written for `image_id`.
    async fn delete_location(
        &self,
        ctx: &RequestContext,
        image_id: &ImageId,
        location: &str,
    ) -> Result<(), EngineError>;
}
