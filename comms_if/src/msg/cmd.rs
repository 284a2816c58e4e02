//! # Velocity command message

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A velocity command for the base.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TwistCmd {
    /// Linear velocity in the body frame, in meters/second
    pub linear_ms: [f64; 3],

    /// Angular velocity about the body axes, in radians/second
    pub angular_rads: [f64; 3],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TwistCmd {
    /// A planar command, forward speed along x and turn rate about z. All other channels are zero.
    pub fn planar(linear_x_ms: f64, angular_z_rads: f64) -> Self {
        Self {
            linear_ms: [linear_x_ms, 0.0, 0.0],
            angular_rads: [0.0, 0.0, angular_z_rads],
        }
    }

    /// A command to stop.
    pub fn stop() -> Self {
        Self::default()
    }

    /// The forward speed of this command.
    pub fn linear_x_ms(&self) -> f64 {
        self.linear_ms[0]
    }

    /// The turn rate of this command.
    pub fn angular_z_rads(&self) -> f64 {
        self.angular_rads[2]
    }
}
