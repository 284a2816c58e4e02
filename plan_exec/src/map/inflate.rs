//! # Inflation
//!
//! Every occupied cell, and every cell on the border of the grid, is grown by a square window of
//! half-width `pixel_buffer` so that the robot can be treated as a point when checking for
//! collisions. Border cells are always inflated, which gives the map a closed boundary.
//!
//! A square window is separable, so the dilation is done as one pass along the rows followed by
//! one pass along the columns, each using a running count of seed cells. The cost is linear in
//! the number of cells and independent of the buffer size.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::msg::OccupancyGridMsg;
use log::debug;
use ndarray::{Array2, ArrayView2, Axis};

use super::{CellState, MapError, MapParams, OccupancyGrid};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An occupancy grid with obstacles grown to account for the robot's footprint. Read only once
/// built.
#[derive(Debug, Clone, PartialEq)]
pub struct InflatedGrid {
    /// Cell states with dimension order row (y), column (x)
    cells: Array2<CellState>,

    /// Size of each cell in meters per cell
    resolution_m: f64,

    /// Half-width of the inflation window, in cells
    pixel_buffer: usize,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Number of cells to inflate obstacles by.
pub fn pixel_buffer(robot_size_m: f64, resolution_m: f64, inflation_ratio: f64) -> usize {
    (robot_size_m / resolution_m * inflation_ratio).round().max(0.0) as usize
}

/// Inflate the raw grid.
pub fn inflate(raw: &OccupancyGrid, params: &MapParams) -> Result<InflatedGrid, MapError> {
    let valid = |v: f64| v.is_finite() && v >= 0.0;
    if !valid(params.robot_size_m) || !valid(params.inflation_ratio) {
        return Err(MapError::InvalidInflation(
            params.robot_size_m,
            params.inflation_ratio,
        ));
    }

    let buffer = pixel_buffer(
        params.robot_size_m,
        raw.resolution_m(),
        params.inflation_ratio,
    );

    let (height, width) = raw.cells().dim();
    let raw_cells = raw.cells();

    let seeds = Array2::from_shape_fn((height, width), |(r, c)| {
        let border = r == 0 || c == 0 || r == height - 1 || c == width - 1;
        border
            || match raw_cells[[r, c]] {
                CellState::Occupied => true,
                CellState::Unknown => params.unknown_is_occupied,
                CellState::Free => false,
            }
    });

    let dilated = dilate_axis(dilate_axis(seeds.view(), Axis(1), buffer).view(), Axis(0), buffer);

    let cells = Array2::from_shape_fn((height, width), |(r, c)| {
        if dilated[[r, c]] {
            CellState::Occupied
        } else {
            raw_cells[[r, c]]
        }
    });

    let grid = InflatedGrid {
        cells,
        resolution_m: raw.resolution_m(),
        pixel_buffer: buffer,
    };

    debug!(
        "Inflated {}x{} map by {} cells, {} cells now occupied",
        width,
        height,
        buffer,
        grid.num_occupied()
    );

    Ok(grid)
}

/// Mark every cell within `buffer` cells of a seed along `axis`.
fn dilate_axis(seeds: ArrayView2<bool>, axis: Axis, buffer: usize) -> Array2<bool> {
    let len = seeds.len_of(axis);
    let mut out = Array2::from_elem(seeds.raw_dim(), false);

    // prefix[i] is the number of seeds before index i in the lane
    let mut prefix = vec![0usize; len + 1];

    for (src, mut dst) in seeds.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
        for (i, &s) in src.iter().enumerate() {
            prefix[i + 1] = prefix[i] + usize::from(s);
        }
        for (i, d) in dst.iter_mut().enumerate() {
            let lo = i.saturating_sub(buffer);
            let hi = (i + buffer + 1).min(len);
            *d = prefix[hi] > prefix[lo];
        }
    }

    out
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl InflatedGrid {
    pub(super) fn from_parts(cells: Array2<CellState>, resolution_m: f64, pixel_buffer: usize) -> Self {
        Self {
            cells,
            resolution_m,
            pixel_buffer,
        }
    }

    /// Get the (row, col) index of the cell containing the world point, or `None` if the point is
    /// outside the grid.
    pub fn world_to_cell(&self, x_m: f64, y_m: f64) -> Option<(usize, usize)> {
        let col = (x_m / self.resolution_m).floor();
        let row = (y_m / self.resolution_m).floor();

        // Also rejects NaN
        if !(col >= 0.0 && row >= 0.0) {
            return None;
        }

        let (row, col) = (row as usize, col as usize);
        if row >= self.height() || col >= self.width() {
            None
        } else {
            Some((row, col))
        }
    }

    /// True if the cell is occupied or outside the grid.
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        !matches!(
            self.cells.get((row, col)),
            Some(CellState::Free) | Some(CellState::Unknown)
        )
    }

    pub fn get(&self, row: usize, col: usize) -> Option<CellState> {
        self.cells.get((row, col)).copied()
    }

    pub fn cells(&self) -> ArrayView2<CellState> {
        self.cells.view()
    }

    pub fn num_occupied(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&c| c == CellState::Occupied)
            .count()
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

    pub fn pixel_buffer(&self) -> usize {
        self.pixel_buffer
    }

    /// Width of the map in meters
    pub fn world_width_m(&self) -> f64 {
        self.width() as f64 * self.resolution_m
    }

    /// Height of the map in meters
    pub fn world_height_m(&self) -> f64 {
        self.height() as f64 * self.resolution_m
    }

    /// Convert into a message, for recording or display.
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
// TESTS
// ------------------------------------------------------------------------------------------------
