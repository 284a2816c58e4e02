//! # Goal message

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A goal pose. Only the position is used by the planners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalMsg {
    /// Goal position in the map frame, in meters
    pub position_m: [f64; 3],

    /// Goal orientation quaternion in the order `[x, y, z, w]`
    pub orientation_q: [f64; 4],
}
