//! In-memory collaborator fakes shared by the engine's tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use url::Url;

use imgflow_core::{EngineError, Image, ImageId, Task, TaskId};

use crate::registry::{Driver, DriverDeps, FlowOutcome};
use crate::repo::{ImageFactory, ImageRepo, RequestContext, StorageBackend, TaskRepo};

/// One full set of in-memory collaborators wired to a shared auth state.
pub(crate) struct MemoryCollaborators {
    pub context: RequestContext,
    pub task_repo: Arc<MemoryTaskRepo>,
    pub image_repo: Arc<MemoryImageRepo>,
    pub image_factory: Arc<MemoryImageFactory>,
    pub store: Arc<MemoryStore>,
}

impl MemoryCollaborators {
    pub fn new() -> Self {
        let expired = Arc::new(AtomicBool::new(false));
        Self {
            context: RequestContext::new("tester"),
            task_repo: Arc::new(MemoryTaskRepo::default()),
            image_repo: Arc::new(MemoryImageRepo::new(expired.clone())),
            image_factory: Arc::new(MemoryImageFactory::default()),
            store: Arc::new(MemoryStore::new(expired)),
        }
    }

    pub fn deps(&self) -> DriverDeps {
        DriverDeps {
            context: self.context.clone(),
            task_repo: self.task_repo.clone(),
            image_repo: self.image_repo.clone(),
            image_factory: self.image_factory.clone(),
            store: self.store.clone(),
        }
    }
}

pub(crate) fn memory_deps() -> MemoryCollaborators {
    MemoryCollaborators::new()
}

/// A driver that always succeeds with a fixed outcome.
pub(crate) fn ok_driver() -> Arc<dyn Driver> {
    struct OkDriver;

    #[async_trait]
    impl Driver for OkDriver {
        async fn run(&self, _task: &Task) -> Result<FlowOutcome, EngineError> {
            Ok(FlowOutcome {
                image_id: ImageId::generate(),
                message: "ok".to_string(),
            })
        }
    }

    Arc::new(OkDriver)
}

#[derive(Default)]
pub(crate) struct MemoryTaskRepo {
    tasks: Mutex<HashMap<TaskId, Task>>,
    saved_statuses: Mutex<Vec<imgflow_core::TaskStatus>>,
    save_count: AtomicUsize,
}

impl MemoryTaskRepo {
    pub async fn insert(&self, task: Task) {
        self.tasks.lock().await.insert(task.id.clone(), task);
    }

    pub async fn stored(&self, task_id: &TaskId) -> Option<Task> {
        self.tasks.lock().await.get(task_id).cloned()
    }

    pub async fn saved_statuses(&self) -> Vec<imgflow_core::TaskStatus> {
        self.saved_statuses.lock().await.clone()
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }
}

#[async_trait]
impl TaskRepo for MemoryTaskRepo {
    async fn get(&self, task_id: &TaskId) -> Result<Task, EngineError> {
        self.tasks
            .lock()
            .await
            .get(task_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(task_id.to_string()))
    }

    async fn save(&self, task: &Task) -> Result<(), EngineError> {
        self.save_count.fetch_add(1, Ordering::SeqCst);
        self.saved_statuses.lock().await.push(task.status);
        self.tasks.lock().await.insert(task.id.clone(), task.clone());
        Ok(())
    }
}

pub(crate) struct MemoryImageRepo {
    images: Mutex<HashMap<ImageId, Image>>,
    saved_statuses: Mutex<Vec<imgflow_core::ImageStatus>>,
    save_count: AtomicUsize,
    expired: Arc<AtomicBool>,
}

impl MemoryImageRepo {
    fn new(expired: Arc<AtomicBool>) -> Self {
        Self {
            images: Mutex::new(HashMap::new()),
            saved_statuses: Mutex::new(Vec::new()),
            save_count: AtomicUsize::new(0),
            expired,
        }
    }

    pub async fn stored(&self, image_id: &ImageId) -> Option<Image> {
        self.images.lock().await.get(image_id).cloned()
    }

    pub async fn saved_statuses(&self) -> Vec<imgflow_core::ImageStatus> {
        self.saved_statuses.lock().await.clone()
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    fn check_auth(&self) -> Result<(), EngineError> {
        if self.expired.load(Ordering::SeqCst) {
            Err(EngineError::AuthorizationExpired(
                "token no longer valid".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ImageRepo for MemoryImageRepo {
    async fn get(&self, _ctx: &RequestContext, image_id: &ImageId) -> Result<Image, EngineError> {
        self.check_auth()?;
        self.images
            .lock()
            .await
            .get(image_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(image_id.to_string()))
    }

    async fn save(&self, _ctx: &RequestContext, image: &Image) -> Result<(), EngineError> {
        self.check_auth()?;
        self.save_count.fetch_add(1, Ordering::SeqCst);
        self.saved_statuses.lock().await.push(image.status);
        self.images
            .lock()
            .await
            .insert(image.id.clone(), image.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemoryImageFactory {
    created: AtomicUsize,
}

impl MemoryImageFactory {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFactory for MemoryImageFactory {
    async fn new_image(
        &self,
        _ctx: &RequestContext,
        properties: Map<String, Value>,
    ) -> Result<Image, EngineError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Image::new(properties))
    }
}

pub(crate) struct MemoryStore {
    expired: Arc<AtomicBool>,
    expire_after_write: AtomicBool,
    transfer_failure: StdMutex<Option<String>>,
    fail_deletes: AtomicBool,
    write_count: AtomicUsize,
    deleted: Mutex<Vec<String>>,
    write_delay_ms: AtomicU64,
    write_owners: Mutex<Vec<String>>,
    active_writes: AtomicUsize,
    peak_writes: AtomicUsize,
    event_log: Mutex<Vec<String>>,
}

impl MemoryStore {
    fn new(expired: Arc<AtomicBool>) -> Self {
        Self {
            expired,
            expire_after_write: AtomicBool::new(false),
            transfer_failure: StdMutex::new(None),
            fail_deletes: AtomicBool::new(false),
            write_count: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
            write_delay_ms: AtomicU64::new(0),
            write_owners: Mutex::new(Vec::new()),
            active_writes: AtomicUsize::new(0),
            peak_writes: AtomicUsize::new(0),
            event_log: Mutex::new(Vec::new()),
        }
    }

    /// Make every subsequent transfer fail with the given reason.
    pub fn fail_transfer(&self, reason: &str) {
        *self.transfer_failure.lock().unwrap() = Some(reason.to_string());
    }

    /// Invalidate the shared auth context once a transfer completes,
    /// simulating a token that expires mid-flow.
    pub fn expire_context_after_write(&self) {
        self.expire_after_write.store(true, Ordering::SeqCst);
    }

    /// Make `delete_location` fail, to exercise best-effort cleanup.
    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    /// Slow writes down so tests can observe concurrency.
    pub fn set_write_delay(&self, delay: Duration) {
        self.write_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    pub fn peak_concurrent_writes(&self) -> usize {
        self.peak_writes.load(Ordering::SeqCst)
    }

    pub async fn write_owners(&self) -> Vec<String> {
        self.write_owners.lock().await.clone()
    }

    pub async fn deleted(&self) -> Vec<String> {
        self.deleted.lock().await.clone()
    }

    pub async fn events(&self) -> Vec<String> {
        self.event_log.lock().await.clone()
    }
}

#[async_trait]
impl StorageBackend for MemoryStore {
    async fn write(
        &self,
        ctx: &RequestContext,
        image: &Image,
        source: &Url,
    ) -> Result<Vec<String>, EngineError> {
        self.write_owners.lock().await.push(ctx.owner.clone());
        let active = self.active_writes.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_writes.fetch_max(active, Ordering::SeqCst);
        self.event_log
            .lock()
            .await
            .push(format!("write-start {}", image.id));

        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let result = match self.transfer_failure.lock().unwrap().clone() {
            Some(reason) => Err(EngineError::Transfer(reason)),
            None => {
                self.write_count.fetch_add(1, Ordering::SeqCst);
                let name = source
                    .path_segments()
                    .and_then(|mut segments| segments.next_back())
                    .filter(|s| !s.is_empty())
                    .unwrap_or("image");
                let stem = name.split('.').next().unwrap_or(name);
                Ok(vec![format!("store://0/{stem}")])
            }
        };

        self.event_log
            .lock()
            .await
            .push(format!("write-end {}", image.id));
        self.active_writes.fetch_sub(1, Ordering::SeqCst);

        if result.is_ok() && self.expire_after_write.load(Ordering::SeqCst) {
            self.expired.store(true, Ordering::SeqCst);
        }
        result
    }

    async fn delete_location(
        &self,
        _ctx: &RequestContext,
        _image_id: &ImageId,
        location: &str,
    ) -> Result<(), EngineError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(EngineError::Transfer(format!(
                "delete failed for {location}"
            )));
        }
        self.deleted.lock().await.push(location.to_string());
        Ok(())
    }
}
