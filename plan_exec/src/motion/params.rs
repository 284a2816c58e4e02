//! Motion model parameters

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MotionParams {
    /// Duration of a single action, in seconds.
    pub dt_s: f64,

    /// Rate at which the kinematics are integrated and checked for collision, in Hz.
    pub step_hz: f64,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            dt_s: 0.5,
            step_hz: 10.0,
        }
    }
}
