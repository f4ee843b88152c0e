//! Grid Geometry - Fixed Grid <-> Pixel Conversion
//!
//! Slides are laid out on a fixed grid of square cells. Grid ranges use
//! 1-indexed grid *lines* with an exclusive end, so `row 4/9` covers rows
//! 4 through 8.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_CELL_SIZE: u32 = 60;
pub const DEFAULT_COLUMNS: u32 = 32;
pub const DEFAULT_ROWS: u32 = 18;

/// Pixel rectangle on the slide canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Area shared with `other` (0 when they only touch).
    pub fn overlap_area(&self, other: &PixelRect) -> u64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return 0;
        }
        (right - left) as u64 * (bottom - top) as u64
    }

    pub fn contains(&self, other: &PixelRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Row/column range in grid lines, consumed by the external renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRange {
    pub row_start: u32,
    pub row_end: u32,
    pub col_start: u32,
    pub col_end: u32,
}

impl GridRange {
    /// Row span as `start/end`, e.g. `4/9`.
    pub fn grid_row(&self) -> String {
        format!("{}/{}", self.row_start, self.row_end)
    }

    pub fn grid_column(&self) -> String {
        format!("{}/{}", self.col_start, self.col_end)
    }
}

impl fmt::Display for GridRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} col {}", self.grid_row(), self.grid_column())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("{axis} range {start}/{end} is invalid (lines must satisfy 1 <= start < end <= {max_line})")]
    OutOfRange {
        axis: Axis,
        start: u32,
        end: u32,
        max_line: u32,
    },

    #[error("rectangle {rect:?} is empty or exceeds the {canvas_width}x{canvas_height} canvas")]
    OutsideCanvas {
        rect: PixelRect,
        canvas_width: u32,
        canvas_height: u32,
    },

    #[error("grid range {range} diverges from {rect:?} by more than one cell")]
    Divergence { rect: PixelRect, range: GridRange },

    #[error("invalid grid geometry: {0}")]
    InvalidGeometry(String),
}

/// Fixed-grid canvas model. Stateless once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryModel {
    #[serde(default = "default_cell_size")]
    cell_size: u32,
    #[serde(default = "default_columns")]
    columns: u32,
    #[serde(default = "default_rows")]
    rows: u32,
}

fn default_cell_size() -> u32 {
    DEFAULT_CELL_SIZE
}

fn default_columns() -> u32 {
    DEFAULT_COLUMNS
}

fn default_rows() -> u32 {
    DEFAULT_ROWS
}

impl GeometryModel {
    pub fn new(cell_size: u32, columns: u32, rows: u32) -> Result<Self, GeometryError> {
        let model = Self { cell_size, columns, rows };
        model.validate()?;
        Ok(model)
    }

    /// Re-check dimensions, e.g. after deserializing from config.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.cell_size == 0 || self.columns == 0 || self.rows == 0 {
            return Err(GeometryError::InvalidGeometry(format!(
                "cell size, columns and rows must be non-zero (got {}px, {}x{})",
                self.cell_size, self.columns, self.rows
            )));
        }
        let fits = |cells: u32| {
            cells
                .checked_add(1)
                .and_then(|_| cells.checked_mul(self.cell_size))
                .is_some()
        };
        if !(fits(self.columns) && fits(self.rows)) {
            return Err(GeometryError::InvalidGeometry(format!(
                "{}x{} cells of {}px overflow the pixel range",
                self.columns, self.rows, self.cell_size
            )));
        }
        Ok(())
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn canvas(&self) -> PixelRect {
        PixelRect::new(0, 0, self.columns * self.cell_size, self.rows * self.cell_size)
    }

    /// Convert a grid range (1-indexed lines, exclusive end) to pixels.
    pub fn to_pixels(
        &self,
        row_start: u32,
        row_end: u32,
        col_start: u32,
        col_end: u32,
    ) -> Result<PixelRect, GeometryError> {
        check_lines(Axis::Row, row_start, row_end, self.rows + 1)?;
        check_lines(Axis::Column, col_start, col_end, self.columns + 1)?;

        Ok(PixelRect {
            x: (col_start - 1) * self.cell_size,
            y: (row_start - 1) * self.cell_size,
            width: (col_end - col_start) * self.cell_size,
            height: (row_end - row_start) * self.cell_size,
        })
    }

    pub fn range_to_pixels(&self, range: &GridRange) -> Result<PixelRect, GeometryError> {
        self.to_pixels(range.row_start, range.row_end, range.col_start, range.col_end)
    }

    /// Snap a pixel rectangle to the nearest grid lines.
    ///
    /// A range that would collapse to zero cells is widened by one line, so
    /// the result may differ from `rect` by up to one cell per edge, never more.
    pub fn to_grid_range(&self, rect: &PixelRect) -> Result<GridRange, GeometryError> {
        if rect.is_empty() || !self.canvas().contains(rect) {
            let canvas = self.canvas();
            return Err(GeometryError::OutsideCanvas {
                rect: *rect,
                canvas_width: canvas.width,
                canvas_height: canvas.height,
            });
        }

        let (row_start, row_end) = self.snap(rect.y, rect.bottom(), self.rows);
        let (col_start, col_end) = self.snap(rect.x, rect.right(), self.columns);
        let range = GridRange { row_start, row_end, col_start, col_end };

        let snapped = self.range_to_pixels(&range)?;
        let cell = self.cell_size as i64;
        let edges = [
            (snapped.x, rect.x),
            (snapped.y, rect.y),
            (snapped.right(), rect.right()),
            (snapped.bottom(), rect.bottom()),
        ];
        if edges.iter().any(|&(a, b)| (a as i64 - b as i64).abs() > cell) {
            return Err(GeometryError::Divergence { rect: *rect, range });
        }

        Ok(range)
    }

    fn nearest_line(&self, px: u32) -> u32 {
        px.saturating_add(self.cell_size / 2) / self.cell_size
    }

    // Returns 1-indexed (start, end) lines for a pixel span on an axis of `cells`.
    fn snap(&self, start_px: u32, end_px: u32, cells: u32) -> (u32, u32) {
        let start = self.nearest_line(start_px).min(cells);
        let end = self.nearest_line(end_px).min(cells);
        if end > start {
            return (start + 1, end + 1);
        }
        // Span narrower than a cell: take the cell holding its start edge.
        let cell = (start_px / self.cell_size).min(cells - 1);
        (cell + 1, cell + 2)
    }
}

impl Default for GeometryModel {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
        }
    }
}

fn check_lines(axis: Axis, start: u32, end: u32, max_line: u32) -> Result<(), GeometryError> {
    if start < 1 || end > max_line || start >= end {
        return Err(GeometryError::OutOfRange { axis, start, end, max_line });
    }
    Ok(())
}
