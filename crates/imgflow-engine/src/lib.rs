//! Imgflow task-execution engine.
//!
//! The engine accepts a declared long-running operation (a persisted
//! [`Task`]), resolves a driver for its type through the
//! [`registry::DriverRegistry`], runs the driver's flow under a bounded
//! [`pool::WorkerPool`], and reconciles the outcome back into the task
//! record. All failure is expressed through the persisted record:
//! [`executor::TaskExecutor::begin_processing`] never raises past its own
//! boundary.
//!
//! [`Task`]: imgflow_core::Task

pub mod config;
pub mod executor;
pub mod import;
pub mod input;
pub mod pool;
pub mod registry;
pub mod repo;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use config::{EngineMode, ExecutorConfig};
pub use executor::TaskExecutor;
pub use import::ImportFlowFactory;
pub use registry::{Driver, DriverDeps, DriverFactory, DriverRegistry, FlowOutcome};
pub use repo::{ImageFactory, ImageRepo, RequestContext, StorageBackend, TaskRepo};
