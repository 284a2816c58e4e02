//! # Occupancy Grid
//!
//! The raw map as received from the mapping system. Row 0 lies along the map origin (lowest y)
//! and column 0 along the lowest x, so the cell containing world point `(x, y)` is
//! `(floor(y / res), floor(x / res))`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::msg::{OccupancyGridMsg, CELL_FREE, CELL_OCCUPIED, CELL_UNKNOWN};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::MapError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A 2D occupancy grid.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    /// Cell states with dimension order row (y), column (x)
    cells: Array2<CellState>,

    /// Size of each cell in meters per cell
    resolution_m: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Free,
    Occupied,
    Unknown,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CellState {
    /// Interpret a raw message value. Negative values are unknown and values of 100 or more are
    /// occupied, everything else is free.
    pub fn from_raw(value: i8) -> Self {
        match value {
            v if v < 0 => CellState::Unknown,
            v if v >= CELL_OCCUPIED => CellState::Occupied,
            _ => CellState::Free,
        }
    }

    pub fn to_raw(self) -> i8 {
        match self {
            CellState::Free => CELL_FREE,
            CellState::Occupied => CELL_OCCUPIED,
            CellState::Unknown => CELL_UNKNOWN,
        }
    }
}

impl OccupancyGrid {
    /// Build a grid from an occupancy grid message.
    pub fn from_msg(msg: &OccupancyGridMsg) -> Result<Self, MapError> {
        Self::from_raw(msg.width, msg.height, msg.resolution_m, &msg.data)
    }

    /// Build a grid from row-major raw cell values.
    pub fn from_raw(
        width: usize,
        height: usize,
        resolution_m: f64,
        data: &[i8],
    ) -> Result<Self, MapError> {
        validate_shape(width, height, resolution_m)?;

        let expected = width
            .checked_mul(height)
            .ok_or(MapError::InvalidDimensions(width, height))?;
        if data.len() != expected {
            return Err(MapError::DataLengthMismatch {
                expected,
                found: data.len(),
            });
        }

        let cells = Array2::from_shape_fn((height, width), |(r, c)| {
            CellState::from_raw(data[r * width + c])
        });

        Ok(Self {
            cells,
            resolution_m,
        })
    }

    /// Create a new grid where every cell is free.
    pub fn new_free(width: usize, height: usize, resolution_m: f64) -> Result<Self, MapError> {
        validate_shape(width, height, resolution_m)?;

        Ok(Self {
            cells: Array2::from_elem((height, width), CellState::Free),
            resolution_m,
        })
    }

    /// Set the state of the cell at (row, col), returning `false` if the cell is outside the grid.
    pub fn set(&mut self, row: usize, col: usize, state: CellState) -> bool {
        match self.cells.get_mut((row, col)) {
            Some(c) => {
                *c = state;
                true
            }
            None => false,
        }
    }

    /// Mark every cell in the inclusive rectangle of rows and columns as occupied. Parts of the
    /// rectangle outside the grid are ignored.
    pub fn add_obstacle(&mut self, rows: (usize, usize), cols: (usize, usize)) {
        for row in rows.0..=rows.1 {
            for col in cols.0..=cols.1 {
                self.set(row, col, CellState::Occupied);
            }
        }
    }

    /// Get the state of the cell at (row, col).
    pub fn get(&self, row: usize, col: usize) -> Option<CellState> {
        self.cells.get((row, col)).copied()
    }

    pub fn cells(&self) -> ArrayView2<CellState> {
        self.cells.view()
    }

    /// Number of cells along the x axis
    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    /// Number of cells along the y axis
    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    pub fn resolution_m(&self) -> f64 {
        self.resolution_m
    }

    /// Convert back into a message.
    pub fn to_msg(&self) -> OccupancyGridMsg {
        OccupancyGridMsg {
            width: self.width(),
            height: self.height(),
            resolution_m: self.resolution_m,
            data: self.cells.iter().map(|c| c.to_raw()).collect(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

pub(super) fn validate_shape(width: usize, height: usize, resolution_m: f64) -> Result<(), MapError> {
    if !(resolution_m.is_finite() && resolution_m > 0.0) {
        return Err(MapError::InvalidResolution(resolution_m));
    }
    if width == 0 || height == 0 {
        return Err(MapError::InvalidDimensions(width, height));
    }
    Ok(())
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_msg() {
        let mut msg = OccupancyGridMsg::new_free(4, 3, 0.5);
        msg.set(0, 3, CELL_OCCUPIED);
        msg.set(2, 0, CELL_UNKNOWN);

        let grid = OccupancyGrid::from_msg(&msg).unwrap();

        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.get(0, 3), Some(CellState::Occupied));
        assert_eq!(grid.get(2, 0), Some(CellState::Unknown));
        assert_eq!(grid.get(1, 1), Some(CellState::Free));
        assert_eq!(grid.get(3, 0), None);

        assert_eq!(grid.to_msg(), msg);
    }

    #[test]
    fn test_invalid_msg() {
        let mut msg = OccupancyGridMsg::new_free(4, 3, 0.5);
        msg.data.pop();
        assert!(matches!(
            OccupancyGrid::from_msg(&msg),
            Err(MapError::DataLengthMismatch {
                expected: 12,
                found: 11
            })
        ));

        let msg = OccupancyGridMsg::new_free(4, 3, 0.0);
        assert!(matches!(
            OccupancyGrid::from_msg(&msg),
            Err(MapError::InvalidResolution(_))
        ));

        assert!(matches!(
            OccupancyGrid::new_free(0, 3, 0.1),
            Err(MapError::InvalidDimensions(0, 3))
        ));
    }

    #[test]
    fn test_raw_values() {
        assert_eq!(CellState::from_raw(-1), CellState::Unknown);
        assert_eq!(CellState::from_raw(0), CellState::Free);
        assert_eq!(CellState::from_raw(65), CellState::Free);
        assert_eq!(CellState::from_raw(100), CellState::Occupied);
    }
}
