//! # Planning Requests
//!
//! The inputs to a planning run: the inflated map, the start pose and the goal. Requests are
//! built from the messages delivered by the map, odometry and goal sources and passed explicitly
//! into the planners.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::str::FromStr;

use comms_if::msg::{GoalMsg, OdometryMsg};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{map::InflatedGrid, motion::Pose};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A goal position. Orientation is not part of the goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Goal position in meters
    pub position_m: Point2<f64>,
}

/// Everything needed for one planning run.
#[derive(Debug, Clone, Copy)]
pub struct PlanRequest<'a> {
    pub map: &'a InflatedGrid,
    pub start: Pose,
    pub goal: Goal,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GoalParseError {
    #[error("Please enter a goal in the format \"x,y\" (found {0} fields)")]
    WrongNumberOfFields(usize),

    #[error("Goal coordinate {0:?} is not a number")]
    NotNumeric(String),

    #[error("Goal coordinate {0:?} is not finite")]
    NotFinite(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Goal {
    pub fn new(x_m: f64, y_m: f64) -> Self {
        Self {
            position_m: Point2::new(x_m, y_m),
        }
    }

    /// Get the goal from a goal message, ignoring its orientation.
    pub fn from_msg(msg: &GoalMsg) -> Self {
        Self::new(msg.position_m[0], msg.position_m[1])
    }

    /// Distance from the point to the goal, in meters.
    pub fn distance_m(&self, x_m: f64, y_m: f64) -> f64 {
        (Point2::new(x_m, y_m) - self.position_m).norm()
    }

    /// The goal test: true if the point is strictly closer than the tolerance to the goal.
    pub fn is_reached(&self, x_m: f64, y_m: f64, tolerance_m: f64) -> bool {
        self.distance_m(x_m, y_m) < tolerance_m
    }
}

impl FromStr for Goal {
    type Err = GoalParseError;

    /// Parse a goal of the form `"x,y"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        if fields.len() != 2 {
            return Err(GoalParseError::WrongNumberOfFields(fields.len()));
        }

        let parse = |f: &str| -> Result<f64, GoalParseError> {
            let v: f64 = f
                .parse()
                .map_err(|_| GoalParseError::NotNumeric(f.to_string()))?;
            if v.is_finite() {
                Ok(v)
            } else {
                Err(GoalParseError::NotFinite(f.to_string()))
            }
        };

        Ok(Goal::new(parse(fields[0])?, parse(fields[1])?))
    }
}

impl<'a> PlanRequest<'a> {
    pub fn new(map: &'a InflatedGrid, start: Pose, goal: Goal) -> Self {
        Self { map, start, goal }
    }

    /// Build a request from the odometry and goal messages.
    pub fn from_msgs(map: &'a InflatedGrid, odom: &OdometryMsg, goal: &GoalMsg) -> Self {
        Self::new(map, Pose::from_odometry(odom), Goal::from_msg(goal))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_goal() {
        assert_eq!("1,8".parse(), Ok(Goal::new(1.0, 8.0)));
        assert_eq!(" 2.5 , -0.5 ".parse(), Ok(Goal::new(2.5, -0.5)));

        assert_eq!(
            "1".parse::<Goal>(),
            Err(GoalParseError::WrongNumberOfFields(1))
        );
        assert_eq!(
            "1,8,0".parse::<Goal>(),
            Err(GoalParseError::WrongNumberOfFields(3))
        );
        assert_eq!(
            "one,8".parse::<Goal>(),
            Err(GoalParseError::NotNumeric("one".into()))
        );
        assert_eq!(
            "1,".parse::<Goal>(),
            Err(GoalParseError::NotNumeric("".into()))
        );
        assert_eq!(
            "NaN,8".parse::<Goal>(),
            Err(GoalParseError::NotFinite("NaN".into()))
        );
    }

    #[test]
    fn test_goal_test() {
        let goal = Goal::new(1.0, 8.0);
        assert!(goal.is_reached(1.0, 8.0, 0.25));
        assert!(goal.is_reached(1.2, 8.1, 0.25));
        assert!(!goal.is_reached(1.0, 8.25, 0.25));
        assert!(!goal.is_reached(1.0, 7.0, 0.25));
    }

    #[test]
    fn test_goal_test_translation() {
        let goal = Goal::new(1.0, 8.0);
        let points = [(1.1, 8.1), (0.8, 7.9), (1.3, 8.0), (5.0, 5.0), (1.0, 8.24)];
        let shifts = [(3.0, -2.0), (-0.7, 0.35), (10.0, 10.0)];

        for &(x, y) in points.iter() {
            for &(dx, dy) in shifts.iter() {
                let shifted = Goal::new(goal.position_m.x + dx, goal.position_m.y + dy);
                assert_eq!(
                    goal.is_reached(x, y, 0.25),
                    shifted.is_reached(x + dx, y + dy, 0.25)
                );
            }
        }
    }

    #[test]
    fn test_from_msgs() {
        let msg = GoalMsg {
            position_m: [1.0, 8.0, 0.3],
            orientation_q: [0.0, 0.0, 1.0, 0.0],
        };
        assert_eq!(Goal::from_msg(&msg), Goal::new(1.0, 8.0));
    }
}
