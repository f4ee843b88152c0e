//! Dynamic Layout Records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::{GridRange, PixelRect};
use crate::identity::StructuralSpec;
use crate::split::{ratio_to_bp, GridShape, SplitDirection};

/// `split_pattern` value for layouts built from explicit fields.
pub const CUSTOM_PATTERN: &str = "custom";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub zone_id: String,
    pub label: String,
    pub grid: GridRange,
    pub grid_row: String,
    pub grid_column: String,
    pub pixels: PixelRect,
    pub content_type_hint: String,
    pub z_index: u32,
}

impl Zone {
    pub fn zone_id_for(position: usize) -> String {
        format!("zone_{}", position + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicLayout {
    pub layout_id: String,
    pub base_layout: String,
    pub content_type: String,
    pub split_pattern: String,
    pub split_direction: SplitDirection,
    pub zone_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridShape>,
    /// Normalized ratios; rows then columns for grid layouts.
    pub ratios: Vec<f64>,
    pub zones: Vec<Zone>,
    pub content_area: PixelRect,
    pub reusable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub usage_count: u64,
}

impl DynamicLayout {
    /// The identity-bearing subset of this record.
    pub fn structural_spec(&self) -> StructuralSpec {
        StructuralSpec {
            base_layout: self.base_layout.clone(),
            content_type: self.content_type.clone(),
            direction: self.split_direction,
            zone_count: self.zone_count,
            grid_rows: self.grid.map(|g| g.rows),
            grid_columns: self.grid.map(|g| g.columns),
            ratios_bp: self.ratios.iter().map(|&r| ratio_to_bp(r)).collect(),
        }
    }

    pub fn zone(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.zone_id == zone_id)
    }

    pub fn zone_ids(&self) -> Vec<&str> {
        self.zones.iter().map(|z| z.zone_id.as_str()).collect()
    }
}
