//! Search planner parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    /// Resolution used to deduplicate visited poses. Applies to x and y in meters and to the
    /// heading in quarter turns.
    pub key_resolution: f64,

    /// Forward speed of every action, in meters/second.
    pub linear_speed_ms: f64,

    /// Lowest turn rate in the action sweep, in radians/second.
    pub angular_min_rads: f64,

    /// Highest turn rate in the action sweep (inclusive), in radians/second.
    pub angular_max_rads: f64,

    /// Spacing of turn rates in the action sweep, in radians/second.
    pub angular_step_rads: f64,

    /// Cost of taking any action.
    pub action_cost: f64,

    /// Distance from the goal at which it counts as reached, in meters.
    pub goal_tolerance_m: f64,

    /// Maximum number of nodes to expand before giving up.
    pub max_expansions: usize,

    /// Estimate of the cost remaining to the goal.
    #[serde(default)]
    pub heuristic: Heuristic,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heuristic {
    /// Straight line distance to the goal in meters.
    Euclidean,

    /// Minimum number of actions needed to get within tolerance of the goal, times the action
    /// cost. Admissible.
    StepNormalised,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Heuristic {
    fn default() -> Self {
        Heuristic::Euclidean
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            key_resolution: 0.1,
            linear_speed_ms: 1.0,
            angular_min_rads: -PI,
            angular_max_rads: PI,
            angular_step_rads: FRAC_PI_2,
            action_cost: 1.0,
            goal_tolerance_m: 0.25,
            max_expansions: 500_000,
            heuristic: Heuristic::Euclidean,
        }
    }
}
