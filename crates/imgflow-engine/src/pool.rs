//! Bounded worker pools executing flows.
//!
//! A [`PoolProvider`] is built once per executor; the capability probe for
//! the parallel backing happens there, at startup. Each `begin_processing`
//! call acquires a per-call [`WorkerPool`] handle from the provider and
//! releases it when the flow returns. The concurrency bound (`max_workers`
//! slots) is shared across all handles of one provider; which backing runs
//! the flow is not observable beyond that bound.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use imgflow_core::EngineError;

use crate::config::{EngineMode, ExecutorConfig};

/// Builds per-call worker pools according to the executor config.
pub struct PoolProvider {
    inner: ProviderInner,
}

enum ProviderInner {
    Serial,
    Parallel {
        slots: Arc<Semaphore>,
        backing: Backing,
    },
}

enum Backing {
    /// Spawn onto the runtime the engine is already running on.
    Ambient(Handle),
    /// No ambient runtime at construction time; a dedicated OS-thread
    /// runtime of the same size backs the pool instead.
    Fallback(Arc<Runtime>),
}

impl Backing {
    fn handle(&self) -> Handle {
        match self {
            Backing::Ambient(handle) => handle.clone(),
            Backing::Fallback(runtime) => runtime.handle().clone(),
        }
    }
}

impl PoolProvider {
    /// Probe the environment and build the provider for `config`.
    pub fn new(config: &ExecutorConfig) -> Result<Self, EngineError> {
        let inner = match config.mode {
            EngineMode::Serial => ProviderInner::Serial,
            EngineMode::Parallel => {
                let backing = match Handle::try_current() {
                    Ok(handle) => Backing::Ambient(handle),
                    Err(_) => {
                        info!(
                            max_workers = config.max_workers,
                            "No ambient runtime; backing the worker pool with OS threads"
                        );
                        let runtime = tokio::runtime::Builder::new_multi_thread()
                            .worker_threads(config.max_workers)
                            .thread_name("imgflow-worker")
                            .enable_all()
                            .build()
                            .map_err(|e| {
                                EngineError::Unexpected(format!(
                                    "failed to build worker pool runtime: {e}"
                                ))
                            })?;
                        Backing::Fallback(Arc::new(runtime))
                    }
                };
                ProviderInner::Parallel {
                    slots: Arc::new(Semaphore::new(config.max_workers)),
                    backing,
                }
            }
        };
        Ok(Self { inner })
    }

    /// Acquire a pool handle for one `begin_processing` call.
    pub fn acquire(&self) -> WorkerPool {
        let inner = match &self.inner {
            ProviderInner::Serial => PoolInner::Serial,
            ProviderInner::Parallel { slots, backing } => PoolInner::Parallel {
                slots: slots.clone(),
                handle: backing.handle(),
            },
        };
        WorkerPool { inner }
    }

    #[cfg(test)]
    pub(crate) fn uses_fallback_runtime(&self) -> bool {
        matches!(
            self.inner,
            ProviderInner::Parallel {
                backing: Backing::Fallback(_),
                ..
            }
        )
    }
}

/// A worker pool scoped to one `begin_processing` call.
pub struct WorkerPool {
    inner: PoolInner,
}

enum PoolInner {
    Serial,
    Parallel {
        slots: Arc<Semaphore>,
        handle: Handle,
    },
}

impl WorkerPool {
    /// Run one flow to completion inside this pool.
    ///
    /// Serial pools run the future inline on the calling task. Parallel
    /// pools wait for a free slot, spawn the future, and hold the slot
    /// until it finishes; a panic inside the flow surfaces as
    /// [`EngineError::Unexpected`] rather than poisoning the pool.
    pub async fn submit<T, F>(&self, fut: F) -> Result<T, EngineError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, EngineError>> + Send + 'static,
    {
        match &self.inner {
            PoolInner::Serial => fut.await,
            PoolInner::Parallel { slots, handle } => {
                let permit = slots.clone().acquire_owned().await.map_err(|_| {
                    EngineError::Unexpected("worker pool is closed".to_string())
                })?;
                let join = handle.spawn(async move {
                    let _slot = permit;
                    fut.await
                });
                match join.await {
                    Ok(result) => result,
                    Err(err) if err.is_panic() => {
                        Err(EngineError::Unexpected(format!("flow panicked: {err}")))
                    }
                    Err(err) => Err(EngineError::Unexpected(format!("flow cancelled: {err}"))),
                }
            }
        }
    }

    /// Release the pool. In-flight work has already drained because
    /// `submit` runs each flow to completion before returning.
    pub fn shutdown(self) {
        debug!("Worker pool released");
    }
}
