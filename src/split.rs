//! Split Specifications
//!
//! A split spec says how a content area is carved into zones. Ratios are
//! carried as `f64` on input and normalized to basis points before any
//! geometry or identity is derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::ValidationError;

/// Basis points per whole: normalized ratios sum to exactly this.
pub const RATIO_SCALE: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    /// Zones stacked top-to-bottom; the height is split.
    Horizontal,
    /// Zones side by side left-to-right; the width is split.
    Vertical,
    Grid,
}

impl SplitDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitDirection::Horizontal => "horizontal",
            SplitDirection::Vertical => "vertical",
            SplitDirection::Grid => "grid",
        }
    }
}

impl fmt::Display for SplitDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridShape {
    pub rows: u32,
    pub columns: u32,
}

impl GridShape {
    pub fn new(rows: u32, columns: u32) -> Self {
        Self { rows, columns }
    }

    pub fn zone_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Most square factorization, never taller than wide: `rows` is the
    /// largest divisor of `zone_count` with `rows * rows <= zone_count`.
    pub fn factorize(zone_count: usize) -> Self {
        let n = zone_count.max(1);
        let rows = (1..=n)
            .take_while(|d| d * d <= n)
            .filter(|d| n % d == 0)
            .last()
            .unwrap_or(1);
        Self {
            rows: rows as u32,
            columns: (n / rows) as u32,
        }
    }
}

/// Closed set of split shapes; one evaluation path per variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "direction", rename_all = "lowercase")]
pub enum SplitSpec {
    Horizontal {
        ratios: Vec<f64>,
    },
    Vertical {
        ratios: Vec<f64>,
    },
    Grid {
        rows: u32,
        columns: u32,
        row_ratios: Vec<f64>,
        column_ratios: Vec<f64>,
    },
}

impl SplitSpec {
    /// Equal split. For grid, `shape` defaults to [`GridShape::factorize`].
    pub fn equal(direction: SplitDirection, zone_count: usize, shape: Option<GridShape>) -> Self {
        match direction {
            SplitDirection::Horizontal => SplitSpec::Horizontal {
                ratios: equal_ratios(zone_count),
            },
            SplitDirection::Vertical => SplitSpec::Vertical {
                ratios: equal_ratios(zone_count),
            },
            SplitDirection::Grid => {
                let shape = shape.unwrap_or_else(|| GridShape::factorize(zone_count));
                SplitSpec::grid(shape, None, None)
            }
        }
    }

    pub fn grid(shape: GridShape, row_ratios: Option<Vec<f64>>, column_ratios: Option<Vec<f64>>) -> Self {
        SplitSpec::Grid {
            rows: shape.rows,
            columns: shape.columns,
            row_ratios: row_ratios.unwrap_or_else(|| equal_ratios(shape.rows as usize)),
            column_ratios: column_ratios.unwrap_or_else(|| equal_ratios(shape.columns as usize)),
        }
    }

    pub fn direction(&self) -> SplitDirection {
        match self {
            SplitSpec::Horizontal { .. } => SplitDirection::Horizontal,
            SplitSpec::Vertical { .. } => SplitDirection::Vertical,
            SplitSpec::Grid { .. } => SplitDirection::Grid,
        }
    }

    pub fn zone_count(&self) -> usize {
        match self {
            SplitSpec::Horizontal { ratios } | SplitSpec::Vertical { ratios } => ratios.len(),
            SplitSpec::Grid { rows, columns, .. } => GridShape::new(*rows, *columns).zone_count(),
        }
    }

    pub fn grid_shape(&self) -> Option<GridShape> {
        match self {
            SplitSpec::Grid { rows, columns, .. } => Some(GridShape::new(*rows, *columns)),
            _ => None,
        }
    }

    /// Ratio groups that must each sum to 1.0: one for linear splits,
    /// rows then columns for grids.
    pub fn ratio_groups(&self) -> Vec<&[f64]> {
        match self {
            SplitSpec::Horizontal { ratios } | SplitSpec::Vertical { ratios } => vec![ratios.as_slice()],
            SplitSpec::Grid { row_ratios, column_ratios, .. } => {
                vec![row_ratios.as_slice(), column_ratios.as_slice()]
            }
        }
    }

    /// Replace the ratios, keeping direction and grid shape. Grid ratios are
    /// taken as `rows` row ratios followed by `columns` column ratios.
    pub fn with_ratios(&self, ratios: Vec<f64>) -> Result<Self, ValidationError> {
        match self {
            SplitSpec::Horizontal { ratios: current } | SplitSpec::Vertical { ratios: current } => {
                if ratios.len() != current.len() {
                    return Err(ValidationError::ZoneCountMismatch {
                        expected: current.len(),
                        actual: ratios.len(),
                    });
                }
                Ok(match self.direction() {
                    SplitDirection::Vertical => SplitSpec::Vertical { ratios },
                    _ => SplitSpec::Horizontal { ratios },
                })
            }
            SplitSpec::Grid { rows, columns, .. } => {
                let expected = rows
                    .checked_add(*columns)
                    .ok_or(ValidationError::GridShapeMismatch {
                        rows: *rows,
                        columns: *columns,
                        zone_count: ratios.len(),
                    })? as usize;
                if ratios.len() != expected {
                    return Err(ValidationError::ZoneCountMismatch {
                        expected,
                        actual: ratios.len(),
                    });
                }
                let mut row_ratios = ratios;
                let column_ratios = row_ratios.split_off(*rows as usize);
                Ok(SplitSpec::Grid {
                    rows: *rows,
                    columns: *columns,
                    row_ratios,
                    column_ratios,
                })
            }
        }
    }

    /// Quantize each ratio group to basis points summing to [`RATIO_SCALE`].
    ///
    /// Expects a spec that already passed [`crate::validation::SpecValidator`].
    pub fn normalize(&self) -> Result<NormalizedSplit, ValidationError> {
        let mut ratios_bp = Vec::with_capacity(self.zone_count());
        let mut offset = 0;
        for group in self.ratio_groups() {
            ratios_bp.extend(normalize_group(group, offset)?);
            offset += group.len();
        }
        Ok(NormalizedSplit {
            direction: self.direction(),
            grid: self.grid_shape(),
            ratios_bp,
        })
    }
}

/// Validated, quantized split. Geometry and identity are both derived from
/// this value, so equal normalized splits always produce equal zones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedSplit {
    pub direction: SplitDirection,
    pub grid: Option<GridShape>,
    /// Basis points; for grids, row ratios followed by column ratios.
    pub ratios_bp: Vec<u32>,
}

impl NormalizedSplit {
    pub fn zone_count(&self) -> usize {
        match self.grid {
            Some(shape) => shape.zone_count(),
            None => self.ratios_bp.len(),
        }
    }

    /// (row basis points, column basis points) for grids.
    pub fn grid_groups(&self) -> Option<(&[u32], &[u32])> {
        self.grid
            .map(|shape| self.ratios_bp.split_at((shape.rows as usize).min(self.ratios_bp.len())))
    }

    pub fn ratios(&self) -> Vec<f64> {
        self.ratios_bp.iter().map(|&bp| ratio_from_bp(bp)).collect()
    }
}

pub fn equal_ratios(count: usize) -> Vec<f64> {
    vec![1.0 / count.max(1) as f64; count]
}

pub fn ratio_from_bp(bp: u32) -> f64 {
    bp as f64 / RATIO_SCALE as f64
}

pub fn ratio_to_bp(ratio: f64) -> u32 {
    (ratio * RATIO_SCALE as f64).round().max(0.0) as u32
}

// Each ratio is quantized as given; the last entry takes whatever remains of
// RATIO_SCALE, matching the last zone absorbing the pixel remainder.
fn normalize_group(ratios: &[f64], offset: usize) -> Result<Vec<u32>, ValidationError> {
    let Some((_, head)) = ratios.split_last() else {
        return Ok(Vec::new());
    };

    let mut out: Vec<u32> = head.iter().map(|&r| ratio_to_bp(r)).collect();
    if let Some(index) = out.iter().position(|&bp| bp == 0) {
        return Err(ValidationError::InvalidRatio {
            index: offset + index,
            value: ratios[index],
        });
    }

    let used: u64 = out.iter().map(|&bp| bp as u64).sum();
    match (RATIO_SCALE as u64).checked_sub(used) {
        Some(last) if last > 0 => out.push(last as u32),
        _ => {
            return Err(ValidationError::ZoneTooSmall {
                index: offset + head.len(),
            })
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factorize_prefers_wide_grids() {
        assert_eq!(GridShape::factorize(4), GridShape::new(2, 2));
        assert_eq!(GridShape::factorize(6), GridShape::new(2, 3));
        assert_eq!(GridShape::factorize(8), GridShape::new(2, 4));
        assert_eq!(GridShape::factorize(5), GridShape::new(1, 5));
        assert_eq!(GridShape::factorize(2), GridShape::new(1, 2));
    }

    #[test]
    fn test_normalize_sums_to_scale() {
        let spec = SplitSpec::equal(SplitDirection::Horizontal, 3, None);
        let norm = spec.normalize().unwrap();
        assert_eq!(norm.ratios_bp, vec![3333, 3333, 3334]);
        assert_eq!(norm.ratios_bp.iter().sum::<u32>(), RATIO_SCALE);
    }

    #[test]
    fn test_normalize_keeps_ratios_inside_tolerance() {
        let short = SplitSpec::Horizontal { ratios: vec![0.5, 0.49] };
        assert_eq!(short.normalize().unwrap().ratios_bp, vec![5000, 5000]);

        let long = SplitSpec::Vertical { ratios: vec![0.3, 0.3, 0.41] };
        assert_eq!(long.normalize().unwrap().ratios_bp, vec![3000, 3000, 4000]);
    }

    #[test]
    fn test_normalize_rejects_overrun_of_last_entry() {
        let spec = SplitSpec::Horizontal { ratios: vec![1.005, 0.005] };
        assert_eq!(spec.normalize(), Err(ValidationError::ZoneTooSmall { index: 1 }));
    }

    #[test]
    fn test_with_ratios_oversized_grid() {
        let spec = SplitSpec::Grid {
            rows: u32::MAX,
            columns: 2,
            row_ratios: vec![],
            column_ratios: vec![],
        };
        assert!(matches!(
            spec.with_ratios(vec![0.5, 0.5]),
            Err(ValidationError::GridShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_grid_with_ratios_splits_rows_then_columns() {
        let spec = SplitSpec::equal(SplitDirection::Grid, 6, None);
        let custom = spec.with_ratios(vec![0.4, 0.6, 0.2, 0.3, 0.5]).unwrap();
        assert_eq!(
            custom,
            SplitSpec::Grid {
                rows: 2,
                columns: 3,
                row_ratios: vec![0.4, 0.6],
                column_ratios: vec![0.2, 0.3, 0.5],
            }
        );
        let norm = custom.normalize().unwrap();
        let (rows, cols) = norm.grid_groups().unwrap();
        assert_eq!(rows, &[4000, 6000]);
        assert_eq!(cols, &[2000, 3000, 5000]);
    }

    #[test]
    fn test_with_ratios_length_mismatch() {
        let spec = SplitSpec::equal(SplitDirection::Horizontal, 3, None);
        assert_eq!(
            spec.with_ratios(vec![0.5, 0.5]),
            Err(ValidationError::ZoneCountMismatch { expected: 3, actual: 2 })
        );
    }

    #[test]
    fn test_spec_serializes_tagged() {
        let spec = SplitSpec::Horizontal { ratios: vec![0.5, 0.5] };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["direction"], "horizontal");
    }
}
