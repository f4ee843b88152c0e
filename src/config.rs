//! Engine configuration, loaded from JSON with serde defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::EngineError;
use crate::geometry::GeometryModel;
use crate::templates::BaseLayoutRegistry;

pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub geometry: GeometryModel,
    /// Directory for the file-backed store; `None` keeps layouts in memory.
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryModel::default(),
            store_dir: None,
            log_filter: default_log_filter(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Geometry must be non-degenerate and hold every base layout.
    pub fn validate(&self, base_layouts: &BaseLayoutRegistry) -> Result<(), EngineError> {
        self.geometry.validate()?;
        let misfits = base_layouts.misfits(&self.geometry);
        if !misfits.is_empty() {
            return Err(EngineError::Config(format!(
                "base layouts do not fit a {}x{} canvas: {}",
                self.geometry.canvas().width,
                self.geometry.canvas().height,
                misfits.join(", ")
            )));
        }
        Ok(())
    }
}
