//! Imgflow Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Database
//! - Runtime specifics
//!
//! All types here represent the core business domain of the imgflow
//! task-execution engine: persisted tasks, image records, and the
//! error taxonomy shared across the engine.

pub mod context;
pub mod error;
pub mod ids;
pub mod image;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use context::RequestContext;
pub use error::EngineError;
pub use ids::{ImageId, TaskId};
pub use image::Image;
pub use status::{ImageStatus, TaskStatus};
pub use task::Task;
