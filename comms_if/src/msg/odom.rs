//! # Odometry message

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The current pose of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdometryMsg {
    /// Position in the map frame, in meters
    pub position_m: [f64; 3],

    /// Orientation quaternion in the order `[x, y, z, w]`
    pub orientation_q: [f64; 4],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl OdometryMsg {
    /// Create a planar odometry message from a position and yaw angle.
    pub fn from_planar(x_m: f64, y_m: f64, yaw_rad: f64) -> Self {
        let half = 0.5 * yaw_rad;
        Self {
            position_m: [x_m, y_m, 0.0],
            orientation_q: [0.0, 0.0, half.sin(), half.cos()],
        }
    }

    /// Get the yaw (rotation about +z) of the orientation, in radians.
    pub fn yaw_rad(&self) -> f64 {
        let [qx, qy, qz, qw] = self.orientation_q;
        (2.0 * (qx * qy + qz * qw)).atan2(1.0 - 2.0 * (qy * qy + qz * qz))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_yaw() {
        for &yaw in &[0.0, FRAC_PI_2, -FRAC_PI_2, 3.0, -2.5] {
            let odom = OdometryMsg::from_planar(1.0, 2.0, yaw);
            assert!((odom.yaw_rad() - yaw).abs() < 1e-12);
        }

        let odom = OdometryMsg::from_planar(0.0, 0.0, PI);
        assert!((odom.yaw_rad().abs() - PI).abs() < 1e-12);
    }
}
