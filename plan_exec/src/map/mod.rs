//! # Map module
//!
//! Holds the raw occupancy grid received from the mapping system, the inflated grid derived from
//! it which the motion model checks for collisions, and a content-addressed on-disk cache of
//! inflated grids.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod cache;
mod inflate;
mod occupancy;
mod params;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use cache::InflationCache;
pub use inflate::{inflate, pixel_buffer, InflatedGrid};
pub use occupancy::{CellState, OccupancyGrid};
pub use params::{MapParams, MapShape};

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::io;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Map resolution must be positive and finite, found {0}")]
    InvalidResolution(f64),

    #[error("Map dimensions must be non-zero, found {0} x {1} cells")]
    InvalidDimensions(usize, usize),

    #[error("Expected {expected} cells in the map data, found {found}")]
    DataLengthMismatch { expected: usize, found: usize },

    #[error("Robot size and inflation ratio must be non-negative and finite, found {0} m and {1}")]
    InvalidInflation(f64, f64),

    #[error("An IO operation on the inflation cache failed: {0}")]
    CacheIo(io::Error),

    #[error("Couldn't deserialize the cached inflation: {0}")]
    CacheDeserialize(serde_json::Error),

    #[error("Couldn't serialize the inflation for caching: {0}")]
    CacheSerialize(serde_json::Error),

    #[error("Cached inflation doesn't match the requested map: {0}")]
    CacheMismatch(String),
}
