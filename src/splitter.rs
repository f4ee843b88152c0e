//! Zone Splitter - Content Area -> Ordered Zones
//!
//! Pure and stateless: the same area and spec always yield the same zones.

use thiserror::Error;

use crate::geometry::{GeometryError, GeometryModel, PixelRect};
use crate::layout::Zone;
use crate::split::{NormalizedSplit, SplitDirection, SplitSpec, RATIO_SCALE};
use crate::validation::{SpecValidator, ValidationError};

/// Paint order of the first zone; later zones count up from here.
pub const Z_INDEX_BASE: u32 = 100;

pub const HINT_FIRST_ZONE: &str = "heading";
pub const HINT_OTHER_ZONES: &str = "bullets";

#[derive(Debug, Error)]
pub enum SplitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Per-zone labels and content-type hints, applied positionally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneAnnotations {
    pub labels: Vec<String>,
    pub hints: Vec<String>,
}

impl ZoneAnnotations {
    pub fn new(labels: Vec<String>, hints: Vec<String>) -> Self {
        Self { labels, hints }
    }

    pub fn label(&self, position: usize) -> String {
        self.labels
            .get(position)
            .cloned()
            .unwrap_or_else(|| format!("Zone {}", position + 1))
    }

    pub fn hint(&self, position: usize) -> String {
        match self.hints.get(position) {
            Some(hint) => hint.clone(),
            None if position == 0 => HINT_FIRST_ZONE.to_string(),
            None => HINT_OTHER_ZONES.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub normalized: NormalizedSplit,
    pub zones: Vec<Zone>,
}

pub struct ZoneSplitter {
    geometry: GeometryModel,
    validator: SpecValidator,
}

impl ZoneSplitter {
    pub fn new(geometry: GeometryModel) -> Self {
        Self {
            geometry,
            validator: SpecValidator::new(),
        }
    }

    pub fn geometry(&self) -> &GeometryModel {
        &self.geometry
    }

    /// Validate, normalize and split in one step.
    pub fn split(
        &self,
        area: &PixelRect,
        spec: &SplitSpec,
        annotations: &ZoneAnnotations,
    ) -> Result<SplitOutcome, SplitError> {
        self.validator.validate(spec)?;
        let normalized = spec.normalize()?;
        let zones = self.split_normalized(area, &normalized, annotations)?;
        Ok(SplitOutcome { normalized, zones })
    }

    pub fn split_normalized(
        &self,
        area: &PixelRect,
        split: &NormalizedSplit,
        annotations: &ZoneAnnotations,
    ) -> Result<Vec<Zone>, SplitError> {
        let rects = match split.direction {
            SplitDirection::Horizontal => {
                let heights = partition(area.height, &split.ratios_bp)?;
                offsets(area.y, &heights)
                    .map(|(y, height)| PixelRect::new(area.x, y, area.width, height))
                    .collect::<Vec<_>>()
            }
            SplitDirection::Vertical => {
                let widths = partition(area.width, &split.ratios_bp)?;
                offsets(area.x, &widths)
                    .map(|(x, width)| PixelRect::new(x, area.y, width, area.height))
                    .collect()
            }
            SplitDirection::Grid => {
                let (row_bp, col_bp) = split
                    .grid_groups()
                    .ok_or(ValidationError::ZoneCount(split.zone_count()))?;
                let heights = partition(area.height, row_bp)?;
                let widths = partition(area.width, col_bp)?;
                let columns: Vec<_> = offsets(area.x, &widths).collect();
                offsets(area.y, &heights)
                    .flat_map(|(y, height)| {
                        columns
                            .iter()
                            .map(move |&(x, width)| PixelRect::new(x, y, width, height))
                    })
                    .collect()
            }
        };

        rects
            .into_iter()
            .enumerate()
            .map(|(position, pixels)| -> Result<Zone, SplitError> {
                let grid = self.geometry.to_grid_range(&pixels)?;
                Ok(Zone {
                    zone_id: Zone::zone_id_for(position),
                    label: annotations.label(position),
                    grid_row: grid.grid_row(),
                    grid_column: grid.grid_column(),
                    grid,
                    pixels,
                    content_type_hint: annotations.hint(position),
                    z_index: Z_INDEX_BASE + position as u32,
                })
            })
            .collect()
    }
}

impl Default for ZoneSplitter {
    fn default() -> Self {
        Self::new(GeometryModel::default())
    }
}

/// Split `total` pixels by basis points; the last track takes the remainder
/// so the parts always sum to `total`.
pub fn partition(total: u32, ratios_bp: &[u32]) -> Result<Vec<u32>, ValidationError> {
    let scale = RATIO_SCALE as u64;
    let last = ratios_bp.len().saturating_sub(1);
    let mut used = 0u32;
    let mut dims = Vec::with_capacity(ratios_bp.len());

    for (index, &bp) in ratios_bp.iter().enumerate() {
        let dim = if index == last {
            total.saturating_sub(used)
        } else {
            ((bp as u64 * total as u64 + scale / 2) / scale) as u32
        };
        if dim == 0 {
            return Err(ValidationError::ZoneTooSmall { index });
        }
        used += dim;
        dims.push(dim);
    }
    Ok(dims)
}

fn offsets(start: u32, dims: &[u32]) -> impl Iterator<Item = (u32, u32)> + '_ {
    dims.iter().scan(start, |cursor, &dim| {
        let origin = *cursor;
        *cursor += dim;
        Some((origin, dim))
    })
}
