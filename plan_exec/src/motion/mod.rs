//! # Motion Model
//!
//! Unicycle kinematics integrated over a fixed period in a number of sub-steps. The position
//! reached after every sub-step is tested for collision, and a collision at any sub-step rejects
//! the whole motion. Integration uses only the inputs, so identical inputs always give
//! bit-identical results.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod collision;
mod params;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use collision::CollisionChecker;
pub use params::MotionParams;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f64::consts::FRAC_PI_2;

use comms_if::msg::{OdometryMsg, TwistCmd};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use util::maths::wrap_to_pi;

use crate::discrete::{DiscreteMotion, DiscreteState};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A planar pose in the map frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position in meters
    pub position_m: Point2<f64>,

    /// Heading (angle to the +ve x axis) in radians, in the range (-pi, pi]
    pub heading_rad: f64,
}

/// A continuous velocity action, held for one motion period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Control {
    /// Forward speed in meters/second
    pub linear_ms: f64,

    /// Turn rate in radians/second
    pub angular_rads: f64,
}

/// Integrates robot motion over one action period.
#[derive(Debug, Clone)]
pub struct MotionModel {
    params: MotionParams,

    /// Number of integration sub-steps per action
    num_steps: usize,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The outcome of simulating a motion.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction<T> {
    /// The motion was collision free and ended in this state.
    Free(T),

    /// The motion hit an obstacle or left the map.
    Collision,
}

#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    #[error(
        "Motion period ({0} s) and step rate ({1} Hz) must be positive and give at least one step"
    )]
    InvalidParams(f64, f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    /// Create a new pose, wrapping the heading into (-pi, pi].
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Point2::new(x_m, y_m),
            heading_rad: wrap_to_pi(heading_rad),
        }
    }

    /// Get the planar pose from an odometry message.
    pub fn from_odometry(odom: &OdometryMsg) -> Self {
        Self::new(odom.position_m[0], odom.position_m[1], odom.yaw_rad())
    }

    pub fn x(&self) -> f64 {
        self.position_m.x
    }

    pub fn y(&self) -> f64 {
        self.position_m.y
    }

    /// Straight line distance to the point, in meters.
    pub fn distance_to(&self, point_m: &Point2<f64>) -> f64 {
        (point_m - self.position_m).norm()
    }
}

impl Control {
    pub fn new(linear_ms: f64, angular_rads: f64) -> Self {
        Self {
            linear_ms,
            angular_rads,
        }
    }

    pub fn to_twist(&self) -> TwistCmd {
        TwistCmd::planar(self.linear_ms, self.angular_rads)
    }
}

impl<T> Prediction<T> {
    /// Get the resulting state, or `None` on collision.
    pub fn free(self) -> Option<T> {
        match self {
            Prediction::Free(t) => Some(t),
            Prediction::Collision => None,
        }
    }

    pub fn is_collision(&self) -> bool {
        matches!(self, Prediction::Collision)
    }
}

impl MotionModel {
    pub fn new(params: MotionParams) -> Result<Self, MotionError> {
        let num_steps = (params.dt_s * params.step_hz).round();

        if !(params.dt_s > 0.0 && params.step_hz > 0.0 && num_steps >= 1.0 && num_steps.is_finite())
        {
            return Err(MotionError::InvalidParams(params.dt_s, params.step_hz));
        }

        Ok(Self {
            params,
            num_steps: num_steps as usize,
        })
    }

    pub fn params(&self) -> &MotionParams {
        &self.params
    }

    /// Simulate holding the control for one motion period from the given pose.
    ///
    /// Turning motions follow the exact arc for each sub-step, straight motions a straight line.
    pub fn predict<C>(&self, checker: &C, pose: &Pose, control: &Control) -> Prediction<Pose>
    where
        C: CollisionChecker + ?Sized,
    {
        let v = control.linear_ms;
        let w = control.angular_rads;
        let f = self.params.step_hz;

        let mut x = pose.position_m.x;
        let mut y = pose.position_m.y;
        let mut theta = pose.heading_rad;

        for _ in 0..self.num_steps {
            if w != 0.0 {
                let r = v / w;
                x += -r * theta.sin() + r * (theta + w / f).sin();
                y += r * theta.cos() - r * (theta + w / f).cos();
            } else {
                x += v * theta.cos() / f;
                y += v * theta.sin() / f;
            }

            if checker.collides(x, y) {
                return Prediction::Collision;
            }

            theta += w / f;
        }

        Prediction::Free(Pose::new(x, y, theta))
    }

    /// Simulate a sequence of controls from the start pose, returning the final pose.
    pub fn rollout<C>(&self, checker: &C, start: &Pose, controls: &[Control]) -> Prediction<Pose>
    where
        C: CollisionChecker + ?Sized,
    {
        let mut pose = *start;

        for control in controls {
            pose = match self.predict(checker, &pose, control) {
                Prediction::Free(p) => p,
                Prediction::Collision => return Prediction::Collision,
            };
        }

        Prediction::Free(pose)
    }

    /// Simulate a discrete motion from a discrete state.
    ///
    /// Two motion periods are simulated back to back with turn rate `turn_idx * pi/2`, so a unit
    /// turn index rotates the robot by a quarter turn. The final pose is rounded back onto the
    /// integer grid.
    pub fn discrete_predict<C>(
        &self,
        checker: &C,
        state: &DiscreteState,
        linear_ms: f64,
        turn_idx: i32,
    ) -> Prediction<DiscreteState>
    where
        C: CollisionChecker + ?Sized,
    {
        let control = Control::new(linear_ms, turn_idx as f64 * FRAC_PI_2);

        let mid = match self.predict(checker, &state.to_pose(), &control) {
            Prediction::Free(p) => p,
            Prediction::Collision => return Prediction::Collision,
        };

        match self.predict(checker, &mid, &control) {
            Prediction::Free(end) => Prediction::Free(DiscreteState::from_pose(&end)),
            Prediction::Collision => Prediction::Collision,
        }
    }

    /// Simulate one of the discrete motions from a discrete state.
    pub fn discrete_motion<C>(
        &self,
        checker: &C,
        state: &DiscreteState,
        motion: DiscreteMotion,
    ) -> Prediction<DiscreteState>
    where
        C: CollisionChecker + ?Sized,
    {
        self.discrete_predict(checker, state, motion.linear_ms(), motion.turn_idx())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::discrete::Heading;
    use crate::map::{inflate, MapParams, OccupancyGrid};
    use std::f64::consts::PI;

    fn no_obstacles(_: f64, _: f64) -> bool {
        false
    }

    fn model() -> MotionModel {
        MotionModel::new(MotionParams::default()).unwrap()
    }

    #[test]
    fn test_deterministic() {
        let grid = inflate(
            &OccupancyGrid::new_free(200, 200, 0.05).unwrap(),
            &MapParams::default(),
        )
        .unwrap();
        let m = model();
        let pose = Pose::new(3.3, 4.1, 0.7);

        for &w in &[-PI, -FRAC_PI_2, 0.0, 0.3, FRAC_PI_2, PI] {
            let control = Control::new(1.0, w);
            let a = m.predict(&grid, &pose, &control);
            let b = m.predict(&grid, &pose, &control);
            assert_eq!(a, b);

            let a = a.free().unwrap();
            let b = b.free().unwrap();
            assert_eq!(a.x().to_bits(), b.x().to_bits());
            assert_eq!(a.y().to_bits(), b.y().to_bits());
            assert_eq!(a.heading_rad.to_bits(), b.heading_rad.to_bits());
        }

        // Collisions are just as repeatable
        let near_wall = Pose::new(0.7, 5.0, PI);
        let control = Control::new(1.0, 0.0);
        assert!(m.predict(&grid, &near_wall, &control).is_collision());
        assert!(m.predict(&grid, &near_wall, &control).is_collision());
    }

    #[test]
    fn test_straight_line() {
        let m = model();
        let pose = Pose::new(2.0, 2.0, 0.3);

        let end = m
            .predict(&no_obstacles, &pose, &Control::new(1.0, 0.0))
            .free()
            .unwrap();

        assert!((end.x() - (2.0 + 0.5 * 0.3f64.cos())).abs() < 1e-12);
        assert!((end.y() - (2.0 + 0.5 * 0.3f64.sin())).abs() < 1e-12);
        assert_eq!(end.heading_rad, 0.3);
    }

    #[test]
    fn test_arc() {
        let m = model();

        // Half a period of a quarter circle of radius 1
        let end = m
            .predict(&no_obstacles, &Pose::new(0.0, 0.0, 0.0), &Control::new(FRAC_PI_2, FRAC_PI_2))
            .free()
            .unwrap();
        let quarter = PI / 4.0;
        assert!((end.x() - quarter.sin()).abs() < 1e-12);
        assert!((end.y() - (1.0 - quarter.cos())).abs() < 1e-12);
        assert!((end.heading_rad - quarter).abs() < 1e-12);

        // Turn on the spot
        let end = m
            .predict(&no_obstacles, &Pose::new(1.0, 1.0, 0.0), &Control::new(0.0, -PI))
            .free()
            .unwrap();
        assert_eq!(end.position_m, Point2::new(1.0, 1.0));
        assert!((end.heading_rad + FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_collision_aborts() {
        let m = model();
        let wall = |x: f64, _: f64| x > 1.2;

        assert!(m
            .predict(&wall, &Pose::new(1.0, 0.0, 0.0), &Control::new(1.0, 0.0))
            .is_collision());

        // Sub-step positions are checked, not just the end point
        let band = |x: f64, _: f64| x > 1.15 && x < 1.25;
        assert!(m
            .predict(&band, &Pose::new(1.0, 0.0, 0.0), &Control::new(1.0, 0.0))
            .is_collision());
        assert!(!m
            .predict(&band, &Pose::new(1.0, 0.0, 0.0), &Control::new(0.1, 0.0))
            .is_collision());
    }

    #[test]
    fn test_discrete_predict() {
        let m = model();

        for heading in Heading::ALL.iter() {
            let state = DiscreteState::new(5, 5, *heading);

            let left = m.discrete_predict(&no_obstacles, &state, 0.0, 1).free().unwrap();
            assert_eq!(left, DiscreteState::new(5, 5, heading.rotated(1)));

            let right = m.discrete_predict(&no_obstacles, &state, 0.0, -1).free().unwrap();
            assert_eq!(right, DiscreteState::new(5, 5, heading.rotated(-1)));
        }

        let state = DiscreteState::new(5, 5, Heading::North);
        assert_eq!(
            m.discrete_motion(&no_obstacles, &state, DiscreteMotion::Forward),
            Prediction::Free(DiscreteState::new(5, 6, Heading::North))
        );
        assert_eq!(
            m.discrete_motion(&no_obstacles, &state, DiscreteMotion::ArcLeft),
            Prediction::Free(DiscreteState::new(4, 6, Heading::West))
        );
        assert_eq!(
            m.discrete_motion(&no_obstacles, &state, DiscreteMotion::ArcRight),
            Prediction::Free(DiscreteState::new(6, 6, Heading::East))
        );

        // A collision in either half rejects the motion
        let wall = |_: f64, y: f64| y > 5.7;
        assert!(m
            .discrete_motion(&wall, &state, DiscreteMotion::Forward)
            .is_collision());
    }

    #[test]
    fn test_rollout() {
        let m = model();
        let start = Pose::new(1.0, 1.0, 0.0);
        let controls = [Control::new(1.0, 0.0), Control::new(1.0, 0.0)];

        let end = m.rollout(&no_obstacles, &start, &controls).free().unwrap();
        assert!((end.x() - 2.0).abs() < 1e-12);
        assert_eq!(m.rollout(&no_obstacles, &start, &[]), Prediction::Free(start));

        let wall = |x: f64, _: f64| x > 1.8;
        assert!(m.rollout(&wall, &start, &controls).is_collision());
    }

    #[test]
    fn test_from_odometry() {
        let odom = OdometryMsg::from_planar(1.5, -2.0, 3.0 * FRAC_PI_2);
        let pose = Pose::from_odometry(&odom);
        assert_eq!(pose.position_m, Point2::new(1.5, -2.0));
        assert!((pose.heading_rad + FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_params() {
        assert!(MotionModel::new(MotionParams {
            dt_s: 0.0,
            step_hz: 10.0
        })
        .is_err());
        assert!(MotionModel::new(MotionParams {
            dt_s: 0.01,
            step_hz: 10.0
        })
        .is_err());
    }
}
