//! MDP planner parameters

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MdpParams {
    /// Reward for being in a state which collides with the map. Also the value of any transition
    /// which collides.
    pub crash_penalty: f64,

    /// Reward for being at the goal.
    pub goal_reward: f64,

    /// Discount factor applied to future rewards, in [0, 1).
    pub discount: f64,

    /// Scale of the distance penalty normalisation. The penalty for being `d` meters from the
    /// goal is `d / (scale * (map_width_m + map_height_m))`.
    pub distance_penalty_scale: f64,

    /// Distance from the goal at which it counts as reached, in meters.
    pub goal_tolerance_m: f64,

    /// Maximum number of value iteration sweeps.
    pub max_sweeps: usize,

    /// Sweeps stop early once the largest change in value over a sweep falls below this.
    pub convergence_tol: f64,
}

impl Default for MdpParams {
    fn default() -> Self {
        Self {
            crash_penalty: -20.0,
            goal_reward: 20.0,
            discount: 0.95,
            distance_penalty_scale: 10.0,
            goal_tolerance_m: 0.25,
            max_sweeps: 200,
            convergence_tol: 1e-6,
        }
    }
}
