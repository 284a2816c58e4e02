//! # Occupancy grid message

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Raw value of a cell whose occupancy is unknown.
pub const CELL_UNKNOWN: i8 = -1;

/// Raw value of a free cell.
pub const CELL_FREE: i8 = 0;

/// Raw value of an occupied cell.
pub const CELL_OCCUPIED: i8 = 100;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A raw occupancy grid as delivered by the mapping system.
///
/// Cells are stored row-major, with row 0 at the map origin (lowest y) and column 0 at the
/// lowest x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyGridMsg {
    /// Number of cells along the x axis
    pub width: usize,

    /// Number of cells along the y axis
    pub height: usize,

    /// Size of each cell in meters per cell
    pub resolution_m: f64,

    /// Cell values, one of [`CELL_UNKNOWN`], [`CELL_FREE`] or [`CELL_OCCUPIED`].
    pub data: Vec<i8>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OccupancyGridMsg {
    /// Create a message describing a completely free grid.
    pub fn new_free(width: usize, height: usize, resolution_m: f64) -> Self {
        Self {
            width,
            height,
            resolution_m,
            data: vec![CELL_FREE; width * height],
        }
    }

    /// Set the raw value of the cell at (row, col), returning `false` if it's outside the grid.
    pub fn set(&mut self, row: usize, col: usize, value: i8) -> bool {
        if row >= self.height || col >= self.width {
            return false;
        }
        self.data[row * self.width + col] = value;
        true
    }
}
