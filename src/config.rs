//! Pipeline configuration.
//!
//! The rotation angle set and the lineage prefixes are configuration, not
//! logic: they are owned by whoever drives the renderer and must match what
//! it actually produced. Defaults cover the common every-15-degrees sweep.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RotolabelError;
use crate::label::MIN_BOX_SIZE;

/// Configuration shared across pipeline stages.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rotation angles (degrees) the renderer produced derivatives for.
    pub angles: Vec<i32>,

    /// Filename prefix marking rotation-derived images in the final set.
    pub rotated_prefix: String,

    /// Filename prefix marking background-substituted images in the final set.
    pub background_prefix: String,

    /// Smallest normalized box extent written after transformation.
    pub min_box_size: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            angles: (0..360).step_by(15).collect(),
            rotated_prefix: "rot_".to_string(),
            background_prefix: "bg_".to_string(),
            min_box_size: MIN_BOX_SIZE,
        }
    }
}

impl PipelineConfig {
    /// Load a config from a YAML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, RotolabelError> {
        let text = fs::read_to_string(path).map_err(RotolabelError::Io)?;
        serde_yaml::from_str(&text).map_err(|source| RotolabelError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
