//! Map parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::PathBuf;

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MapParams {
    /// Size of the robot footprint, in meters.
    pub robot_size_m: f64,

    /// Multiplier applied to the robot size when computing the inflation buffer.
    pub inflation_ratio: f64,

    /// If true cells of unknown occupancy are inflated like occupied cells, otherwise they are
    /// treated as traversable.
    #[serde(default)]
    pub unknown_is_occupied: bool,

    /// Directory to store inflated maps in, relative to the software root. If not provided maps
    /// are inflated on every run.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Shape of the all-free map used when no map is supplied.
    pub free_map: MapShape,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MapShape {
    /// Number of cells along the x axis
    pub width_cells: usize,

    /// Number of cells along the y axis
    pub height_cells: usize,

    /// Size of each cell, in meters
    pub resolution_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for MapParams {
    fn default() -> Self {
        Self {
            robot_size_m: 0.2552,
            inflation_ratio: 2.0,
            unknown_is_occupied: false,
            cache_dir: None,
            free_map: MapShape {
                width_cells: 200,
                height_cells: 200,
                resolution_m: 0.05,
            },
        }
    }
}
