//! Unpacking and validation of import task input.

use serde_json::{Map, Value};
use url::Url;

use imgflow_core::{EngineError, Task};

/// URI schemes an import source may use.
const SUPPORTED_SCHEMES: &[&str] = &["http", "https"];

/// Validated input of one import task.
#[derive(Debug, Clone)]
pub struct ImportInput {
    /// The validated source location.
    pub source: Url,

    /// Declared properties for the image to create.
    pub image_properties: Map<String, Value>,
}

impl ImportInput {
    /// Unpack and validate the input of an import task.
    ///
    /// This runs before any driver is instantiated so a malformed input
    /// fails fast without consuming a worker slot.
    pub fn from_task(task: &Task) -> Result<Self, EngineError> {
        let input = task.input.as_object().ok_or_else(|| {
            EngineError::Validation(format!(
                "input of task {} is not a mapping of import parameters",
                task.id
            ))
        })?;

        let location = input
            .get("import_from")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                EngineError::Validation("input does not contain 'import_from' field".to_string())
            })?;
        let source = validate_location_uri(location)?;

        let image_properties = match input.get("image_properties") {
            Some(Value::Object(props)) => props.clone(),
            Some(_) => {
                return Err(EngineError::Validation(
                    "'image_properties' must be a mapping".to_string(),
                ))
            }
            None => Map::new(),
        };

        Ok(Self {
            source,
            image_properties,
        })
    }
}

/// Validate a source location URI against the supported import schemes.
pub fn validate_location_uri(location: &str) -> Result<Url, EngineError> {
    if location.is_empty() {
        return Err(EngineError::Validation("Invalid location: ".to_string()));
    }
    let url = Url::parse(location)
        .map_err(|e| EngineError::Validation(format!("Invalid location: {location}: {e}")))?;
    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(EngineError::Validation(format!(
            "Invalid location: {location}: unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(EngineError::Validation(format!(
            "Invalid location: {location}: missing host"
        )));
    }
    Ok(url)
}
