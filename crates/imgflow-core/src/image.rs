//! The Image record manipulated by import flows.

use crate::{ImageId, ImageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An image record in the registry.
///
/// During an import the record is observable in `Saving` status before any
/// bytes have been transferred, so a crash mid-transfer leaves a visibly
/// incomplete record rather than a phantom-absent one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Unique image identifier.
    pub id: ImageId,

    /// Current domain status.
    pub status: ImageStatus,

    /// Declared image properties (name, disk format, ...), opaque here.
    pub properties: Map<String, Value>,

    /// Storage-backed locations holding the image bytes.
    pub locations: Vec<String>,

    /// When the image record was created.
    pub created_at: DateTime<Utc>,
}

impl Image {
    /// Create a new image record in `Queued` status.
    pub fn new(properties: Map<String, Value>) -> Self {
        Self {
            id: ImageId::generate(),
            status: ImageStatus::Queued,
            properties,
            locations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Mark the image as receiving data.
    pub fn begin_saving(&mut self) {
        self.status = ImageStatus::Saving;
    }

    /// Mark the image as fully stored and usable.
    pub fn activate(&mut self) {
        self.status = ImageStatus::Active;
    }

    /// Mark the image as unusable after a failed import.
    pub fn kill(&mut self) {
        self.status = ImageStatus::Killed;
    }

    /// Record storage locations written for this image.
    pub fn add_locations(&mut self, locations: impl IntoIterator<Item = String>) {
        self.locations.extend(locations);
    }
}
