//! Validation System - Split Preconditions
//!
//! Rules check a split spec before any geometry is computed.
//! The first failing rule wins; nothing partial is ever produced.

use thiserror::Error;

use crate::split::{SplitDirection, SplitSpec};

pub const MIN_ZONES: usize = 2;
pub const MAX_ZONES: usize = 8;
pub const RATIO_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Ratios must sum to 1.0 (±0.01), got {sum:.4}")]
    RatioSum { sum: f64 },

    #[error("Zone count {0} is outside 2..=8")]
    ZoneCount(usize),

    #[error("Expected {expected} ratios, got {actual}")]
    ZoneCountMismatch { expected: usize, actual: usize },

    #[error("Unsupported base layout: {0}")]
    UnsupportedBaseLayout(String),

    #[error("Unknown split pattern: {0}")]
    UnknownPattern(String),

    #[error("Ratio {value} at position {index} must be a positive finite number")]
    InvalidRatio { index: usize, value: f64 },

    #[error("Zone {index} would be smaller than one pixel")]
    ZoneTooSmall { index: usize },

    #[error("Grid {rows}x{columns} cannot hold {zone_count} zones")]
    GridShapeMismatch {
        rows: u32,
        columns: u32,
        zone_count: usize,
    },

    #[error("Split direction {requested} conflicts with pattern `{pattern}` ({expected})")]
    DirectionMismatch {
        pattern: String,
        requested: SplitDirection,
        expected: SplitDirection,
    },

    #[error("Invalid layout id `{0}`: expected X<1-5>-<8 hex chars>")]
    InvalidLayoutId(String),

    #[error("Content type must not be empty")]
    EmptyContentType,
}

impl ValidationError {
    /// Stable machine-readable code for error reports.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::RatioSum { .. } => "ratio_sum",
            ValidationError::ZoneCount(_) => "zone_count",
            ValidationError::ZoneCountMismatch { .. } => "zone_count_mismatch",
            ValidationError::UnsupportedBaseLayout(_) => "unsupported_base_layout",
            ValidationError::UnknownPattern(_) => "unknown_pattern",
            ValidationError::InvalidRatio { .. } => "invalid_ratio",
            ValidationError::ZoneTooSmall { .. } => "zone_too_small",
            ValidationError::GridShapeMismatch { .. } => "grid_shape_mismatch",
            ValidationError::DirectionMismatch { .. } => "direction_mismatch",
            ValidationError::InvalidLayoutId(_) => "invalid_layout_id",
            ValidationError::EmptyContentType => "empty_content_type",
        }
    }
}

pub fn check_zone_count(zone_count: usize) -> Result<(), ValidationError> {
    if !(MIN_ZONES..=MAX_ZONES).contains(&zone_count) {
        return Err(ValidationError::ZoneCount(zone_count));
    }
    Ok(())
}

/// Validation rule trait - one precondition per rule
pub trait SplitRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, spec: &SplitSpec) -> Result<(), ValidationError>;
}

// --- Concrete Rules ---

pub struct ZoneCountRule;

impl SplitRule for ZoneCountRule {
    fn name(&self) -> &'static str { "zone_count" }

    fn check(&self, spec: &SplitSpec) -> Result<(), ValidationError> {
        if let Some(shape) = spec.grid_shape() {
            if shape.rows == 0 || shape.columns == 0 {
                return Err(ValidationError::GridShapeMismatch {
                    rows: shape.rows,
                    columns: shape.columns,
                    zone_count: shape.zone_count(),
                });
            }
        }
        check_zone_count(spec.zone_count())
    }
}

pub struct RatioCountRule;

impl SplitRule for RatioCountRule {
    fn name(&self) -> &'static str { "ratio_count" }

    fn check(&self, spec: &SplitSpec) -> Result<(), ValidationError> {
        if let SplitSpec::Grid { rows, columns, row_ratios, column_ratios } = spec {
            for (expected, actual) in [(*rows, row_ratios.len()), (*columns, column_ratios.len())] {
                if expected as usize != actual {
                    return Err(ValidationError::ZoneCountMismatch {
                        expected: expected as usize,
                        actual,
                    });
                }
            }
        }
        Ok(())
    }
}

pub struct RatioValueRule;

impl SplitRule for RatioValueRule {
    fn name(&self) -> &'static str { "ratio_value" }

    fn check(&self, spec: &SplitSpec) -> Result<(), ValidationError> {
        let flat = spec.ratio_groups().into_iter().flatten().enumerate();
        for (index, &value) in flat {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::InvalidRatio { index, value });
            }
        }
        Ok(())
    }
}

pub struct RatioSumRule;

impl SplitRule for RatioSumRule {
    fn name(&self) -> &'static str { "ratio_sum" }

    fn check(&self, spec: &SplitSpec) -> Result<(), ValidationError> {
        for group in spec.ratio_groups() {
            let sum: f64 = group.iter().sum();
            // 0.99 and 1.01 are inclusive bounds
            if (sum - 1.0).abs() > RATIO_SUM_TOLERANCE + 1e-9 {
                return Err(ValidationError::RatioSum { sum });
            }
        }
        Ok(())
    }
}

/// Validator runs rules in order and stops at the first failure
pub struct SpecValidator {
    rules: Vec<Box<dyn SplitRule>>,
}

impl SpecValidator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(ZoneCountRule),
                Box::new(RatioCountRule),
                Box::new(RatioValueRule),
                Box::new(RatioSumRule),
            ],
        }
    }

    pub fn validate(&self, spec: &SplitSpec) -> Result<(), ValidationError> {
        for rule in &self.rules {
            if let Err(err) = rule.check(spec) {
                tracing::debug!(rule = rule.name(), error = %err, "split spec rejected");
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }
}

impl Default for SpecValidator {
    fn default() -> Self {
        Self::new()
    }
}
